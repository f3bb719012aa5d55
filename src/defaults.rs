use std::collections::HashMap;
use std::sync::Arc;

use crate::schema::{FieldType, Schema};
use crate::source::{Source, join_key};

/// Schema defaults exposed as a [`Source`].
///
/// Tree nodes already fall back to their own defaults, so this is only
/// needed when a [`SourceList`](crate::SourceList) is queried directly, or
/// when defaults of one schema should back a tree built from another. Keys are
/// the dotted leaf paths relative to `root`; lookups under any other path
/// miss, while path-less lookups are taken as already relative.
#[derive(Debug, Clone)]
pub struct DefaultsSource {
    root: String,
    values: HashMap<String, String>,
}

impl DefaultsSource {
    pub fn new(schema: &Arc<Schema>, root: &str) -> Self {
        let mut values = HashMap::new();
        collect(schema, "", &mut values);
        Self {
            root: root.to_string(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn relative<'k>(&self, full: &'k str) -> Option<&'k str> {
        if self.root.is_empty() {
            return Some(full);
        }
        full.strip_prefix(self.root.as_str())?.strip_prefix('.')
    }
}

fn collect(schema: &Schema, prefix: &str, out: &mut HashMap<String, String>) {
    for field in schema.fields() {
        let dotted = join_key(Some(prefix), field.name());
        match field.ty() {
            FieldType::Nested(child) => collect(child, &dotted, out),
            FieldType::Primitive(_) => {
                if let Some(default) = field.default() {
                    out.insert(dotted, default.to_string());
                }
            }
        }
    }
}

impl Source for DefaultsSource {
    fn get(&self, key: &str, path: Option<&str>) -> Option<String> {
        match path.filter(|p| !p.is_empty()) {
            // Path-less lookups are already relative.
            None => self.values.get(key).cloned(),
            Some(path) => {
                let full = join_key(Some(path), key);
                self.values.get(self.relative(&full)?).cloned()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SourceList;
    use crate::fixtures::test::{layered_schema, map_source};

    #[test]
    fn answers_defaults_below_root() {
        let defaults = DefaultsSource::new(&layered_schema(), "root");
        assert_eq!(defaults.get("value", Some("root")).as_deref(), Some("root config value"));
        assert_eq!(
            defaults.get("value", Some("root.l1b.l2a")).as_deref(),
            Some("level 2 config A value")
        );
        assert_eq!(
            defaults.get("schema_default", Some("root.subsection")).as_deref(),
            Some("subsection default from schema")
        );
    }

    #[test]
    fn fields_without_defaults_and_foreign_paths_miss() {
        let defaults = DefaultsSource::new(&layered_schema(), "root");
        assert_eq!(defaults.get("nodefault", Some("root")), None);
        assert_eq!(defaults.get("value", Some("other")), None);
        assert_eq!(defaults.get("value", Some("rootish")), None);
        assert_eq!(defaults.get("l1a.value", None).as_deref(), Some("level 1 config A value"));
    }

    #[test]
    fn empty_root_uses_relative_keys() {
        let defaults = DefaultsSource::new(&layered_schema(), "");
        assert_eq!(defaults.get("value", Some("l1a")).as_deref(), Some("level 1 config A value"));
        assert_eq!(defaults.get("value", None).as_deref(), Some("root config value"));
        // l1a, l1b each: value + 2 * l2 value; subsection: schema_default; root value
        assert_eq!(defaults.len(), 8);
    }

    #[test]
    fn sits_below_other_sources() {
        let list = SourceList::empty()
            .with(map_source(&[("root.value", "override")]))
            .with(DefaultsSource::new(&layered_schema(), "root"));
        assert_eq!(list.get("value", Some("root")).as_deref(), Some("override"));
        assert_eq!(list.get("value", Some("root.l1a")).as_deref(), Some("level 1 config A value"));
    }
}
