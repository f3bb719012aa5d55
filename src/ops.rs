//! Read-side operations on a loaded tree: single-key lookup and listing.
//!
//! Provides the logic behind a `config get` / `config list` style command and
//! the `ConfigResult` enum that callers use to display results.

use std::fmt;

use crate::error::ConfigError;
use crate::tree::Configuration;

/// Shown in listings for a field nothing could supply.
pub const MISSING_MARKER: &str = "<missing>";

/// Result of a read operation. Returned to the caller for display.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigResult {
    /// One key's resolved value.
    KeyValue { key: String, value: String },
    /// Every declared leaf under a node, `None` where the value is missing.
    Listing {
        entries: Vec<(String, Option<String>)>,
    },
}

impl ConfigResult {
    /// Keys without a value, in listing order. Empty for `KeyValue`.
    pub fn missing_keys(&self) -> Vec<&str> {
        match self {
            ConfigResult::KeyValue { .. } => Vec::new(),
            ConfigResult::Listing { entries } => entries
                .iter()
                .filter(|(_, value)| value.is_none())
                .map(|(key, _)| key.as_str())
                .collect(),
        }
    }
}

impl fmt::Display for ConfigResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigResult::KeyValue { key, value } => write!(f, "{key} = {value}"),
            ConfigResult::Listing { entries } => {
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{key} = {}", value.as_deref().unwrap_or(MISSING_MARKER))?;
                }
                Ok(())
            }
        }
    }
}

/// Get a value by dotted key, relative to `config`.
pub fn get_value(config: &Configuration<'_>, key: &str) -> Result<ConfigResult, ConfigError> {
    let value = config.get_path(key)?;
    Ok(ConfigResult::KeyValue {
        key: key.into(),
        value,
    })
}

/// List every declared leaf under `config`, keyed relative to it.
///
/// Missing values are recorded as `None` instead of failing the listing; any
/// other error is returned.
pub fn list_values(config: &Configuration<'_>) -> Result<ConfigResult, ConfigError> {
    let mut entries = Vec::new();
    for key in config.schema().leaf_paths() {
        let value = match config.get_path(&key) {
            Ok(v) => Some(v),
            Err(e) if e.is_missing_value() => None,
            Err(e) => return Err(e),
        };
        entries.push((key, value));
    }
    Ok(ConfigResult::Listing { entries })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{layered_schema, map_source};
    use crate::source::SourceList;
    use crate::tree::ConfigTree;

    fn test_tree() -> ConfigTree {
        ConfigTree::build(
            SourceList::empty().with(map_source(&[("root.l1b.l2a.value", "from source")])),
            layered_schema(),
            "root",
        )
    }

    #[test]
    fn get_flat_key() {
        let tree = test_tree();
        let result = get_value(&tree.root(), "value").unwrap();
        assert_eq!(
            result,
            ConfigResult::KeyValue {
                key: "value".into(),
                value: "root config value".into()
            }
        );
    }

    #[test]
    fn get_nested_key() {
        let tree = test_tree();
        match get_value(&tree.root(), "l1b.l2a.value").unwrap() {
            ConfigResult::KeyValue { value, .. } => assert_eq!(value, "from source"),
            other => panic!("Expected KeyValue, got {other:?}"),
        }
    }

    #[test]
    fn get_missing_key_is_an_error() {
        let tree = test_tree();
        let err = get_value(&tree.root(), "subsection.key1").unwrap_err();
        assert!(err.is_missing_value());
    }

    #[test]
    fn get_through_a_value_is_an_error() {
        let tree = test_tree();
        let err = get_value(&tree.root(), "value.deeper").unwrap_err();
        assert!(matches!(err, ConfigError::NotASection { .. }));
    }

    #[test]
    fn list_values_includes_all_leaves() {
        let tree = test_tree();
        match list_values(&tree.root()).unwrap() {
            ConfigResult::Listing { entries } => {
                let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
                assert!(keys.contains(&"value"));
                assert!(keys.contains(&"nodefault"));
                assert!(keys.contains(&"l1a.l2b.value"));
                assert!(keys.contains(&"subsection.schema_default"));
                assert_eq!(entries.len(), 11);
            }
            other => panic!("Expected Listing, got {other:?}"),
        }
    }

    #[test]
    fn list_values_marks_missing() {
        let tree = test_tree();
        let result = list_values(&tree.root()).unwrap();
        assert_eq!(result.missing_keys(), ["subsection.doc", "subsection.key1", "nodefault"]);
    }

    #[test]
    fn list_values_of_a_subsection() {
        let tree = test_tree();
        let l1b = tree.root().section("l1b").unwrap();
        match list_values(&l1b).unwrap() {
            ConfigResult::Listing { entries } => {
                assert_eq!(
                    entries,
                    vec![
                        ("l2a.value".to_string(), Some("from source".to_string())),
                        ("l2b.value".to_string(), Some("level 2 config B value".to_string())),
                        ("value".to_string(), Some("level 1 config B value".to_string())),
                    ]
                );
            }
            other => panic!("Expected Listing, got {other:?}"),
        }
    }

    #[test]
    fn listing_display_format() {
        let result = ConfigResult::Listing {
            entries: vec![
                ("host".into(), Some("localhost".into())),
                ("token".into(), None),
            ],
        };
        assert_eq!(format!("{result}"), "host = localhost\ntoken = <missing>");
    }
}
