//! TOML files as a configuration source.
//!
//! Tables nest, so both `environments` and `sections` formats resolve a
//! lookup by walking `path.key` one dotted segment at a time. Non-string
//! scalars are returned in their TOML text form (`3000`, `true`, `1.5`,
//! `3.0`); tables and arrays are never returned. The `toml` parser does not
//! keep source text, so integers and floats are re-rendered: `0x1F` comes
//! back as `31` and `1e3` as `1000.0`.

use std::path::{Path, PathBuf};

use toml::{Table, Value};

use crate::error::ConfigError;
use crate::file::{FileTree, read_config_file, segments, select_environment_tree};
use crate::source::{Source, join_key};
use crate::types::{FileFormat, FileOptions};

fn table_to_tree(table: Table) -> FileTree {
    FileTree::Branch(
        table
            .into_iter()
            .map(|(key, value)| (key, value_to_tree(value)))
            .collect(),
    )
}

/// Render a float the way TOML writes it, so `3.0` keeps its fractional part.
/// Exponent forms come back expanded (`1e3` is `1000.0`).
fn float_text(f: f64) -> String {
    let text = f.to_string();
    if f.is_finite() && !text.contains('.') {
        format!("{text}.0")
    } else {
        text
    }
}

fn value_to_tree(value: Value) -> FileTree {
    match value {
        Value::String(s) => FileTree::Leaf(s),
        Value::Integer(i) => FileTree::Leaf(i.to_string()),
        Value::Float(f) => FileTree::Leaf(float_text(f)),
        Value::Boolean(b) => FileTree::Leaf(b.to_string()),
        Value::Datetime(dt) => FileTree::Leaf(dt.to_string()),
        Value::Array(_) => FileTree::List,
        Value::Table(t) => table_to_tree(t),
    }
}

/// A configuration source backed by a TOML file.
#[derive(Debug, Clone)]
pub struct TomlSource {
    path: PathBuf,
    format: FileFormat,
    env: Option<String>,
    data: FileTree,
}

impl TomlSource {
    /// Open and parse `path`. Missing files follow `options.missing`.
    pub fn open(path: impl AsRef<Path>, options: &FileOptions) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match read_config_file(path, options.missing)? {
            Some(content) => Self::from_str(&content, options, path),
            None => Ok(Self {
                path: path.to_path_buf(),
                format: options.format,
                env: None,
                data: FileTree::Empty,
            }),
        }
    }

    /// Parse already-loaded TOML text. `origin` is used in error messages.
    pub fn from_str(
        content: &str,
        options: &FileOptions,
        origin: impl AsRef<Path>,
    ) -> Result<Self, ConfigError> {
        let path = origin.as_ref();
        let table: Table = toml::from_str(content).map_err(|e: toml::de::Error| ConfigError::Parse {
            path: path.to_path_buf(),
            format: "TOML",
            reason: e.to_string(),
        })?;
        let tree = table_to_tree(table);

        let (env, data) = match options.format {
            FileFormat::Environments => {
                let (env, sub) =
                    select_environment_tree(tree, options.config_env.as_deref(), path)?;
                (Some(env), sub)
            }
            FileFormat::Sections | FileFormat::Flat => (None, tree),
        };

        Ok(Self {
            path: path.to_path_buf(),
            format: options.format,
            env,
            data,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The selected environment (`environments` format only).
    pub fn environment(&self) -> Option<&str> {
        self.env.as_deref()
    }

    /// Top-level keys of the loaded (environment-scoped) data.
    pub fn keys(&self) -> Vec<&str> {
        match &self.data {
            FileTree::Branch(map) => map.keys().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }
}

impl Source for TomlSource {
    fn get(&self, key: &str, path: Option<&str>) -> Option<String> {
        match self.format {
            FileFormat::Environments | FileFormat::Sections => {
                self.data.lookup(segments(key, path))
            }
            FileFormat::Flat => self.data.lookup_flat(&join_key(path, key)),
        }
    }
}
