//! YAML files as a configuration source.
//!
//! Mappings nest like TOML tables. Scalars keep the text they were written
//! with: `1.10`, `0x1F`, `yes` and `null` come back exactly as in the file,
//! and only an empty scalar is absent. Sequences are never returned.
//!
//! The document is read twice. The first pass parses a [`Value`] to learn
//! the shape of every node; the second walks the same events guided by that
//! shape and asks for each scalar as a string, which skips type inference.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::de::{self, DeserializeSeed, Deserializer, IgnoredAny, MapAccess, Visitor};
use serde_yaml::{Mapping, Value};

use crate::error::ConfigError;
use crate::file::{FileTree, read_config_file, segments, select_environment_tree};
use crate::source::{Source, join_key};
use crate::types::{FileFormat, FileOptions};

fn untag(value: &Value) -> &Value {
    match value {
        Value::Tagged(tagged) => untag(&tagged.value),
        other => other,
    }
}

/// Deserializes one node into a [`FileTree`], using the already parsed
/// `Value` of the same node to choose between map, sequence and string.
struct Shaped<'v>(&'v Value);

impl<'de> DeserializeSeed<'de> for Shaped<'_> {
    type Value = FileTree;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<FileTree, D::Error> {
        match untag(self.0) {
            Value::Mapping(map) => deserializer.deserialize_map(MappingVisitor(map)),
            Value::Sequence(_) => {
                deserializer.deserialize_ignored_any(IgnoredAny)?;
                Ok(FileTree::List)
            }
            _ => {
                let text = String::deserialize(deserializer)?;
                Ok(if text.is_empty() {
                    FileTree::Empty
                } else {
                    FileTree::Leaf(text)
                })
            }
        }
    }
}

/// Mapping keys as raw text. Non-scalar keys are consumed and dropped.
struct KeyText<'v>(&'v Value);

impl<'de> DeserializeSeed<'de> for KeyText<'_> {
    type Value = Option<String>;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        match untag(self.0) {
            Value::Mapping(_) | Value::Sequence(_) => {
                deserializer.deserialize_ignored_any(IgnoredAny)?;
                Ok(None)
            }
            _ => String::deserialize(deserializer).map(Some),
        }
    }
}

struct MappingVisitor<'v>(&'v Mapping);

impl<'de> Visitor<'de> for MappingVisitor<'_> {
    type Value = FileTree;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a YAML mapping")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<FileTree, A::Error> {
        let mut branch = BTreeMap::new();
        for (key, value) in self.0.iter() {
            let Some(name) = access.next_key_seed(KeyText(key))? else {
                return Err(de::Error::custom("mapping ended early"));
            };
            let node = access.next_value_seed(Shaped(value))?;
            if let Some(name) = name {
                branch.insert(name, node);
            }
        }
        Ok(FileTree::Branch(branch))
    }
}

/// Parse `content` into a tree whose leaves are the scalars' source text.
fn parse_raw(content: &str) -> Result<FileTree, serde_yaml::Error> {
    let shape: Value = serde_yaml::from_str(content)?;
    match untag(&shape) {
        Value::Mapping(_) => {
            Shaped(&shape).deserialize(serde_yaml::Deserializer::from_str(content))
        }
        _ => Ok(FileTree::Empty),
    }
}

/// A configuration source backed by a YAML file.
#[derive(Debug, Clone)]
pub struct YamlSource {
    path: PathBuf,
    format: FileFormat,
    env: Option<String>,
    data: FileTree,
}

impl YamlSource {
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

    /// Parse already-loaded YAML text. `origin` is used in error messages.
    pub fn from_str(
        content: &str,
        options: &FileOptions,
        origin: impl AsRef<Path>,
    ) -> Result<Self, ConfigError> {
        let path = origin.as_ref();
        let tree = parse_raw(content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            format: "YAML",
            reason: e.to_string(),
        })?;

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

impl Source for YamlSource {
    fn get(&self, key: &str, path: Option<&str>) -> Option<String> {
        match self.format {
            FileFormat::Environments | FileFormat::Sections => {
                self.data.lookup(segments(key, path))
            }
            FileFormat::Flat => self.data.lookup_flat(&join_key(path, key)),
        }
    }
}
