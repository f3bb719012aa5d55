//! Shared plumbing for the file-backed sources: reading under a
//! missing-file policy, the nested key tree used by the TOML and YAML
//! sources, environment selection, and config file discovery.
//!
//! # Missing files
//!
//! [`read_config_file`] applies a [`MissingFilePolicy`] in one place so every
//! format degrades the same way: `warn` logs and yields `None`, `ignore`
//! yields `None`, `error` fails with [`ConfigError::FileNotFound`]. Only a
//! missing file is subject to the policy; other I/O errors always propagate.
//!
//! # Discovery
//!
//! [`locate_config_file`] picks the file to open: an explicit path wins, then
//! the `{PREFIX}_CONFIG_FILE` variable, then the search paths. Search paths
//! are listed in **priority-ascending** order (last = highest), and the
//! highest-priority directory that contains the file is chosen.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::types::{MissingFilePolicy, SearchPath};

/// Read a config file, applying `policy` when it does not exist.
pub fn read_config_file(
    path: &Path,
    policy: MissingFilePolicy,
) -> Result<Option<String>, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => match policy {
            MissingFilePolicy::Warn => {
                tracing::warn!(path = %path.display(), "Config file not found");
                Ok(None)
            }
            MissingFilePolicy::Ignore => Ok(None),
            MissingFilePolicy::Error => Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }),
        },
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Parsed file content normalized to string leaves.
///
/// Only [`FileTree::Leaf`] values are ever returned from a lookup. Asking for
/// a branch (a whole section) or a list yields nothing.
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) enum FileTree {
    Leaf(String),
    Branch(BTreeMap<String, FileTree>),
    List,
    #[default]
    Empty,
}

impl FileTree {
    pub(crate) fn child(&self, name: &str) -> Option<&FileTree> {
        match self {
            FileTree::Branch(map) => map.get(name),
            _ => None,
        }
    }

    /// Walk `segments` and return the leaf at the end, if it is a non-empty
    /// string.
    pub(crate) fn lookup<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Option<String> {
        let mut node = self;
        for segment in segments {
            node = node.child(segment)?;
        }
        match node {
            FileTree::Leaf(s) if !s.is_empty() => Some(s.clone()),
            _ => None,
        }
    }

    /// Top-level literal lookup: `name` is not split on dots.
    pub(crate) fn lookup_flat(&self, name: &str) -> Option<String> {
        self.lookup(std::iter::once(name))
    }

    pub(crate) fn into_child(self, name: &str) -> Option<FileTree> {
        match self {
            FileTree::Branch(mut map) => map.remove(name),
            _ => None,
        }
    }

    pub(crate) fn is_branch(&self) -> bool {
        matches!(self, FileTree::Branch(_))
    }
}

/// Split a `(key, path)` lookup into its dotted segments.
pub(crate) fn segments<'a>(key: &'a str, path: Option<&'a str>) -> impl Iterator<Item = &'a str> {
    path.filter(|p| !p.is_empty())
        .into_iter()
        .flat_map(|p| p.split('.'))
        .chain(key.split('.'))
}

/// Pick the environment to load: the explicit request, else the file's
/// declared default.
pub(crate) fn select_environment(
    requested: Option<&str>,
    declared_default: Option<&str>,
    path: &Path,
) -> Result<String, ConfigError> {
    match requested.or(declared_default) {
        Some(env) if !env.is_empty() => Ok(env.to_string()),
        _ => Err(ConfigError::NoDefaultEnvironment {
            path: path.to_path_buf(),
        }),
    }
}

/// Select one environment sub-tree from a parsed `environments`-mode file.
///
/// The default environment is read from `batconf.default_env`, falling back to
/// a top-level `default` key.
pub(crate) fn select_environment_tree(
    tree: FileTree,
    requested: Option<&str>,
    path: &Path,
) -> Result<(String, FileTree), ConfigError> {
    let declared = tree
        .lookup(["batconf", "default_env"])
        .or_else(|| tree.lookup_flat("default"));
    let env = select_environment(requested, declared.as_deref(), path)?;
    match tree.into_child(&env) {
        Some(sub) if sub.is_branch() => {
            tracing::debug!(path = %path.display(), env = %env, "config environment selected");
            Ok((env, sub))
        }
        _ => Err(ConfigError::UnknownEnvironment {
            env,
            path: path.to_path_buf(),
        }),
    }
}

/// Resolve a single-directory [`SearchPath`] to a concrete path.
///
/// `app_name` is used by `SearchPath::Platform` to construct the platform-specific
/// config directory (e.g. `~/.config/{app_name}/` on Linux).
///
/// Returns `None` if the path cannot be resolved (e.g. no home directory found).
pub fn resolve_search_path(sp: &SearchPath, app_name: &str) -> Option<PathBuf> {
    match sp {
        SearchPath::Platform => {
            let proj = directories::ProjectDirs::from("", "", app_name)?;
            Some(proj.config_dir().to_path_buf())
        }
        SearchPath::Home(subdir) => {
            let user = directories::UserDirs::new()?;
            Some(user.home_dir().join(subdir))
        }
        SearchPath::Cwd => std::env::current_dir().ok(),
        SearchPath::Path(p) => Some(p.clone()),
    }
}

/// Choose the config file to open.
///
/// 1. `explicit` (e.g. a `--config-file` flag), used even if it does not exist
///    so the source's missing-file policy applies to it;
/// 2. `env_value` (the `{PREFIX}_CONFIG_FILE` variable), same treatment;
/// 3. the highest-priority search path holding `file_name`.
pub fn locate_config_file(
    explicit: Option<&Path>,
    env_value: Option<&str>,
    search_paths: &[SearchPath],
    file_name: &str,
    app_name: &str,
) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(path) = env_value.filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(path));
    }
    search_paths
        .iter()
        .rev()
        .filter_map(|sp| resolve_search_path(sp, app_name))
        .map(|dir| dir.join(file_name))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use tracing_test::traced_test;

    fn branch(entries: &[(&str, FileTree)]) -> FileTree {
        FileTree::Branch(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    fn leaf(s: &str) -> FileTree {
        FileTree::Leaf(s.into())
    }

    #[test]
    fn read_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.toml");
        fs::write(&path, "port = 3000\n").unwrap();
        let content = read_config_file(&path, MissingFilePolicy::Error).unwrap();
        assert_eq!(content.as_deref(), Some("port = 3000\n"));
    }

    #[test]
    #[traced_test]
    fn missing_file_warn_logs_and_continues() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.ini");
        let content = read_config_file(&path, MissingFilePolicy::Warn).unwrap();
        assert!(content.is_none());
        assert!(logs_contain("Config file not found"));
    }

    #[test]
    #[traced_test]
    fn missing_file_ignore_is_silent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.ini");
        let content = read_config_file(&path, MissingFilePolicy::Ignore).unwrap();
        assert!(content.is_none());
        assert!(!logs_contain("Config file not found"));
    }

    #[test]
    fn missing_file_error_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.ini");
        let err = read_config_file(&path, MissingFilePolicy::Error).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { path: ref p } if p == &path));
    }

    #[test]
    fn directory_is_an_io_error_not_a_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = read_config_file(dir.path(), MissingFilePolicy::Ignore).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn lookup_returns_leaves_only() {
        let tree = branch(&[(
            "project",
            branch(&[("database", branch(&[("token", leaf("*token-str*"))]))]),
        )]);
        assert_eq!(
            tree.lookup(segments("token", Some("project.database"))).as_deref(),
            Some("*token-str*")
        );
        assert_eq!(tree.lookup(segments("database", Some("project"))), None);
        assert_eq!(tree.lookup(segments("missing", Some("project"))), None);
        assert_eq!(tree.lookup(segments("token", Some("project.database.token"))), None);
    }

    #[test]
    fn lookup_skips_lists_and_empty_strings() {
        let tree = branch(&[("tags", FileTree::List), ("blank", leaf(""))]);
        assert_eq!(tree.lookup(["tags"]), None);
        assert_eq!(tree.lookup(["blank"]), None);
    }

    #[test]
    fn flat_lookup_does_not_split() {
        let tree = branch(&[("key.with.dots", leaf("val.with.dots"))]);
        assert_eq!(tree.lookup_flat("key.with.dots").as_deref(), Some("val.with.dots"));
        assert_eq!(tree.lookup(segments("dots", Some("key.with"))), None);
    }

    #[test]
    fn segments_ignore_empty_path() {
        let segs: Vec<&str> = segments("a.b", Some("")).collect();
        assert_eq!(segs, ["a", "b"]);
        let segs: Vec<&str> = segments("c", Some("a.b")).collect();
        assert_eq!(segs, ["a", "b", "c"]);
    }

    #[test]
    fn environment_tree_uses_declared_default() {
        let tree = branch(&[
            ("batconf", branch(&[("default_env", leaf("dev"))])),
            ("dev", branch(&[("k", leaf("dev value"))])),
            ("prod", branch(&[("k", leaf("prod value"))])),
        ]);
        let (env, sub) = select_environment_tree(tree.clone(), None, Path::new("f")).unwrap();
        assert_eq!(env, "dev");
        assert_eq!(sub.lookup(["k"]).as_deref(), Some("dev value"));

        let (env, sub) = select_environment_tree(tree, Some("prod"), Path::new("f")).unwrap();
        assert_eq!(env, "prod");
        assert_eq!(sub.lookup(["k"]).as_deref(), Some("prod value"));
    }

    #[test]
    fn environment_tree_accepts_legacy_default_key() {
        let tree = branch(&[
            ("default", leaf("example")),
            ("example", branch(&[("k", leaf("v"))])),
        ]);
        let (env, _) = select_environment_tree(tree, None, Path::new("f")).unwrap();
        assert_eq!(env, "example");
    }

    #[test]
    fn environment_tree_errors() {
        let tree = branch(&[("dev", branch(&[]))]);
        assert!(matches!(
            select_environment_tree(tree.clone(), None, Path::new("f")),
            Err(ConfigError::NoDefaultEnvironment { .. })
        ));
        assert!(matches!(
            select_environment_tree(tree, Some("staging"), Path::new("f")),
            Err(ConfigError::UnknownEnvironment { ref env, .. }) if env == "staging"
        ));
    }

    #[test]
    fn locate_prefers_explicit_then_env() {
        let explicit = PathBuf::from("/explicit/config.ini");
        assert_eq!(
            locate_config_file(Some(&explicit), Some("/env/config.ini"), &[], "config.ini", "app"),
            Some(explicit)
        );
        assert_eq!(
            locate_config_file(None, Some("/env/config.ini"), &[], "config.ini", "app"),
            Some(PathBuf::from("/env/config.ini"))
        );
        assert_eq!(locate_config_file(None, Some(""), &[], "config.ini", "app"), None);
    }

    #[test]
    fn locate_picks_highest_priority_existing_file() {
        let low = TempDir::new().unwrap();
        let high = TempDir::new().unwrap();
        let empty = TempDir::new().unwrap();
        fs::write(low.path().join("config.ini"), "").unwrap();
        fs::write(high.path().join("config.ini"), "").unwrap();

        let paths = vec![
            SearchPath::Path(low.path().to_path_buf()),
            SearchPath::Path(high.path().to_path_buf()),
            SearchPath::Path(empty.path().to_path_buf()),
        ];
        assert_eq!(
            locate_config_file(None, None, &paths, "config.ini", "app"),
            Some(high.path().join("config.ini"))
        );
    }

    #[test]
    fn locate_returns_none_when_nothing_found() {
        let dir = TempDir::new().unwrap();
        let paths = vec![SearchPath::Path(dir.path().to_path_buf())];
        assert_eq!(locate_config_file(None, None, &paths, "config.ini", "app"), None);
    }

    #[test]
    fn resolve_explicit_path() {
        let p = PathBuf::from("/tmp/myapp");
        assert_eq!(resolve_search_path(&SearchPath::Path(p.clone()), "ignored"), Some(p));
    }
}
