use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::args::{cli_source, flatten_serialize};
use crate::defaults::DefaultsSource;
use crate::env::{DEFAULT_ENV_PREFIX, EnvSource, config_file_var};
use crate::error::ConfigError;
use crate::file::locate_config_file;
use crate::schema::Schema;
use crate::source::{Source, SourceList, join_key};
use crate::toml_file::TomlSource;
use crate::tree::ConfigTree;
use crate::types::{CliStrategy, FileFormat, FileOptions, MissingFilePolicy, SearchPath};

/// File name looked up in the search paths when none is configured.
pub const DEFAULT_CONFIG_FILE_NAME: &str = "config.yaml";

/// Entry point for building a configuration tree.
pub struct Batconf;

impl Batconf {
    pub fn builder(schema: Arc<Schema>) -> BatconfBuilder {
        BatconfBuilder::new(schema)
    }
}

/// Assembles the standard source chain and builds a [`ConfigTree`] over it.
///
/// Lookup order, highest priority first:
///
/// 1. CLI overrides ([`cli_override`](Self::cli_override),
///    [`cli_overrides_from`](Self::cli_overrides_from));
/// 2. extra sources added with [`source`](Self::source), in insertion order;
/// 3. environment variables;
/// 4. the config file;
/// 5. schema defaults.
pub struct BatconfBuilder {
    schema: Arc<Schema>,
    root_path: Option<String>,
    app_name: Option<String>,
    env_prefix: Option<String>,
    env_enabled: bool,
    env_vars: Option<Vec<(String, String)>>,
    config_file: Option<PathBuf>,
    config_file_name: Option<String>,
    search_paths: Option<Vec<SearchPath>>,
    file_options: FileOptions,
    cli_overrides: Vec<(String, String)>,
    cli_strategy: CliStrategy,
    extra_sources: Vec<Box<dyn Source>>,
}

impl BatconfBuilder {
    fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            root_path: None,
            app_name: None,
            env_prefix: None,
            env_enabled: true,
            env_vars: None,
            config_file: None,
            config_file_name: None,
            search_paths: None,
            file_options: FileOptions::default(),
            cli_overrides: Vec::new(),
            cli_strategy: CliStrategy::default(),
            extra_sources: Vec::new(),
        }
    }

    /// Namespace path of the tree root (default: the lowercased app name, or
    /// empty when there is none).
    pub fn root_path(mut self, path: &str) -> Self {
        self.root_path = Some(path.to_string());
        self
    }

    /// Set the application name. This derives defaults for the root path,
    /// the env prefix and the platform search path.
    pub fn app_name(mut self, name: &str) -> Self {
        self.app_name = Some(name.to_string());
        self
    }

    /// Override the env prefix (default: uppercased app name, else `BAT`).
    /// It names `{PREFIX}_CONFIG_FILE` and path-less env lookups.
    pub fn env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_string());
        self
    }

    /// Leave environment variables out of the chain entirely.
    pub fn no_env(mut self) -> Self {
        self.env_enabled = false;
        self
    }

    /// Read these variables instead of snapshotting the process environment.
    pub fn env_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env_vars = Some(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
        self
    }

    /// Use this config file, skipping discovery.
    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// File name to look for in the search paths (default: `config.yaml`).
    pub fn config_file_name(mut self, name: &str) -> Self {
        self.config_file_name = Some(name.to_string());
        self
    }

    /// Replace the default search paths (`[Platform, Cwd]` with an app name,
    /// `[Cwd]` without). Listed in priority-ascending order.
    pub fn search_paths(mut self, paths: Vec<SearchPath>) -> Self {
        self.search_paths = Some(paths);
        self
    }

    pub fn file_format(mut self, format: FileFormat) -> Self {
        self.file_options.format = format;
        self
    }

    /// Environment to select in `environments`-format files.
    pub fn config_env(mut self, env: Option<&str>) -> Self {
        self.file_options.config_env = env.map(str::to_string);
        self
    }

    /// What to do when the config file is missing (default: warn).
    pub fn missing_file(mut self, policy: MissingFilePolicy) -> Self {
        self.file_options.missing = policy;
        self
    }

    /// Add a CLI override keyed relative to the root. `None` values are
    /// ignored (useful for optional clap args).
    pub fn cli_override<V: ToString>(mut self, key: &str, value: Option<V>) -> Self {
        if let Some(v) = value {
            self.cli_overrides.push((key.to_string(), v.to_string()));
        }
        self
    }

    /// Add CLI overrides from any serializable source, auto-matching by name.
    ///
    /// `source` is flattened into dotted pairs and `None` values are skipped.
    /// A pair is kept when its key is a leaf path of the schema or its last
    /// segment names a leaf, so clap-only fields like `verbose` drop out.
    pub fn cli_overrides_from<S: Serialize>(mut self, source: &S) -> Result<Self, ConfigError> {
        let leaves = self.schema.leaf_paths();
        for (key, value) in flatten_serialize(source)? {
            let last = key.rsplit('.').next().unwrap_or(key.as_str());
            let known = leaves
                .iter()
                .any(|leaf| *leaf == key || leaf.rsplit('.').next() == Some(last));
            if known {
                self.cli_overrides.push((key, value));
            }
        }
        Ok(self)
    }

    /// How CLI overrides match lookups (default: last segment).
    pub fn cli_strategy(mut self, strategy: CliStrategy) -> Self {
        self.cli_strategy = strategy;
        self
    }

    /// Add a source between the CLI overrides and the environment.
    pub fn source(mut self, source: impl Source + 'static) -> Self {
        self.extra_sources.push(Box::new(source));
        self
    }

    fn effective_root_path(&self) -> String {
        match (&self.root_path, &self.app_name) {
            (Some(path), _) => path.clone(),
            (None, Some(app)) => app.to_lowercase(),
            (None, None) => String::new(),
        }
    }

    fn effective_env_prefix(&self) -> String {
        match (&self.env_prefix, &self.app_name) {
            (Some(prefix), _) => prefix.clone(),
            (None, Some(app)) => app.to_uppercase(),
            (None, None) => DEFAULT_ENV_PREFIX.to_string(),
        }
    }

    fn effective_search_paths(&self) -> Vec<SearchPath> {
        if let Some(paths) = &self.search_paths {
            return paths.clone();
        }
        match self.app_name {
            Some(_) => vec![SearchPath::Platform, SearchPath::Cwd],
            None => vec![SearchPath::Cwd],
        }
    }

    fn env_source(&self) -> Option<EnvSource> {
        if !self.env_enabled {
            return None;
        }
        let env = match &self.env_vars {
            Some(vars) => EnvSource::from_vars(vars.iter().cloned()),
            None => EnvSource::from_env(),
        };
        Some(env.with_prefix(&self.effective_env_prefix()))
    }

    fn config_path(&self, env: Option<&EnvSource>) -> Option<PathBuf> {
        let var = config_file_var(&self.effective_env_prefix());
        let file_name = self
            .config_file_name
            .as_deref()
            .unwrap_or(DEFAULT_CONFIG_FILE_NAME);
        let app_name = self.app_name.as_deref().unwrap_or("batconf");
        locate_config_file(
            self.config_file.as_deref(),
            env.and_then(|e| e.var(&var)),
            &self.effective_search_paths(),
            file_name,
            app_name,
        )
    }

    fn file_source(&self, env: Option<&EnvSource>) -> Result<Option<Box<dyn Source>>, ConfigError> {
        let Some(path) = self.config_path(env) else {
            return match self.file_options.missing {
                MissingFilePolicy::Warn => {
                    tracing::warn!("No config file found");
                    Ok(None)
                }
                MissingFilePolicy::Ignore => Ok(None),
                MissingFilePolicy::Error => Err(ConfigError::FileNotFound {
                    path: PathBuf::from(
                        self.config_file_name
                            .as_deref()
                            .unwrap_or(DEFAULT_CONFIG_FILE_NAME),
                    ),
                }),
            };
        };
        tracing::debug!(path = %path.display(), "using config file");
        open_file_source(&path, &self.file_options).map(Some)
    }

    /// Build the source chain and the tree.
    ///
    /// Fails only while constructing sources (unreadable or malformed config
    /// file, missing file under the `error` policy, unknown environment).
    /// Fields nothing can supply fail later, when they are read.
    pub fn load(self) -> Result<ConfigTree, ConfigError> {
        let root = self.effective_root_path();
        let prefix = self.effective_env_prefix();
        let env = self.env_source();
        let file = self.file_source(env.as_ref())?;

        let overrides = self
            .cli_overrides
            .iter()
            .map(|(k, v)| (join_key(Some(&root), k), v.clone()));
        let cli = cli_source(self.cli_strategy, overrides);
        let defaults = DefaultsSource::new(&self.schema, &root);

        let mut chain: Vec<Option<Box<dyn Source>>> = vec![cli];
        chain.extend(self.extra_sources.into_iter().map(Some));
        chain.push(env.map(|e| Box::new(e) as Box<dyn Source>));
        chain.push(file);
        chain.push(Some(Box::new(defaults)));

        let sources = SourceList::new(chain);
        tracing::debug!(root = %root, sources = sources.len(), "source chain assembled");
        Ok(ConfigTree::build(sources, self.schema, &root).with_env_prefix(&prefix))
    }
}

/// Open `path` with the file source matching its extension.
pub fn open_file_source(
    path: &Path,
    options: &FileOptions,
) -> Result<Box<dyn Source>, ConfigError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        #[cfg(feature = "ini")]
        Some("ini" | "cfg" | "conf") => {
            Ok(Box::new(crate::ini_file::IniSource::open(path, options)?))
        }
        Some("toml") => Ok(Box::new(TomlSource::open(path, options)?)),
        #[cfg(feature = "yaml")]
        Some("yaml" | "yml") => Ok(Box::new(crate::yaml_file::YamlSource::open(path, options)?)),
        _ => Err(ConfigError::UnsupportedFileType {
            path: path.to_path_buf(),
        }),
    }
}
