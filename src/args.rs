//! In-memory sources for values supplied on the command line.
//!
//! Two matching strategies are provided (see [`CliStrategy`]):
//!
//! - [`ArgsSource`] keys values by the **last** dotted segment only, the way
//!   plain `--name value` flags are usually declared. Options that share a
//!   name in different sections collide: `--key1` answers both
//!   `clients.a.key1` and `clients.b.key1`.
//! - [`NamespaceSource`] keys values by the **full** dotted path, so
//!   `--set clients.a.key1=x` only answers `clients.a.key1`.
//!
//! Both can be built from `(key, value)` pairs or from any `Serialize` value
//! such as a clap-derived struct; nested structs flatten to dotted keys and
//! `None` fields are skipped.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::source::{Source, join_key};
use crate::types::CliStrategy;

/// Values matched by complete dotted path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceSource {
    values: BTreeMap<String, String>,
}

impl NamespaceSource {
    /// If multiple entries target the same key, the last one wins.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            values: pairs.into_iter().collect(),
        }
    }

    pub fn from_serialize<S: Serialize>(source: &S) -> Result<Self, serde_json::Error> {
        Ok(Self::from_pairs(flatten_serialize(source)?))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Source for NamespaceSource {
    fn get(&self, key: &str, path: Option<&str>) -> Option<String> {
        self.values.get(&join_key(path, key)).cloned()
    }
}

/// Values matched by the last dotted segment of the key; the lookup path is
/// ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgsSource {
    values: BTreeMap<String, String>,
}

impl ArgsSource {
    /// Keys are reduced to their last segment on the way in, so
    /// `("database.url", v)` and `("url", v)` populate the same slot. The last
    /// entry wins.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (last_segment(&k).to_string(), v))
                .collect(),
        }
    }

    pub fn from_serialize<S: Serialize>(source: &S) -> Result<Self, serde_json::Error> {
        Ok(Self::from_pairs(flatten_serialize(source)?))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Source for ArgsSource {
    fn get(&self, key: &str, _path: Option<&str>) -> Option<String> {
        self.values.get(last_segment(key)).cloned()
    }
}

fn last_segment(key: &str) -> &str {
    key.rsplit('.').next().unwrap_or(key)
}

/// Build the CLI source for `strategy`, or `None` when there is nothing to
/// serve so the slot can be dropped from a [`SourceList`](crate::SourceList).
pub fn cli_source(
    strategy: CliStrategy,
    pairs: impl IntoIterator<Item = (String, String)>,
) -> Option<Box<dyn Source>> {
    match strategy {
        CliStrategy::LastSegment => {
            let source = ArgsSource::from_pairs(pairs);
            (!source.is_empty()).then(|| Box::new(source) as Box<dyn Source>)
        }
        CliStrategy::FullPath => {
            let source = NamespaceSource::from_pairs(pairs);
            (!source.is_empty()).then(|| Box::new(source) as Box<dyn Source>)
        }
    }
}

/// Flatten a `Serialize` value into dotted key/value string pairs.
///
/// `Outer { database: Inner { url: "pg://" } }` → `[("database.url", "pg://")]`.
/// Nulls are skipped; scalars are rendered as text; arrays are skipped since
/// they have no single-string form.
pub fn flatten_serialize<S: Serialize>(
    source: &S,
) -> Result<Vec<(String, String)>, serde_json::Error> {
    let value = serde_json::to_value(source)?;
    let mut out = Vec::new();
    flatten_value(&value, "", &mut out);
    Ok(out)
}

fn flatten_value(value: &Value, prefix: &str, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let dotted = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_value(child, &dotted, out);
            }
        }
        Value::Null | Value::Array(_) => {}
        Value::String(s) => out.push((prefix.to_string(), s.clone())),
        Value::Bool(b) => out.push((prefix.to_string(), b.to_string())),
        Value::Number(n) => out.push((prefix.to_string(), n.to_string())),
    }
}
