//! The configuration tree: a schema materialized as an arena of nodes, each
//! bound to a dotted namespace path and to the shared [`SourceList`].
//!
//! # Build
//!
//! [`ConfigTree::build`] walks the schema once, top-down. Every nested field
//! becomes a child node at `path.field`; every primitive field becomes a value
//! slot carrying its schema default, if any. Building never fails: a field
//! that nothing can supply only errors when it is read.
//!
//! # Resolve
//!
//! [`Configuration::resolve`] answers a field name in this order:
//!
//! 1. a child section, returned as-is (no source lookup);
//! 2. the first source in the list with a non-empty value for
//!    `(name, node path)`;
//! 3. the schema default;
//! 4. otherwise [`ConfigError::MissingValue`].
//!
//! Value slots memoize their first resolution in a `OnceLock`: concurrent
//! readers of the same field block on a single lookup and share its result.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::env::{DEFAULT_ENV_PREFIX, env_var_name};
use crate::error::ConfigError;
use crate::schema::{DescribeSchema, FieldType, Schema};
use crate::source::{Source, SourceList, join_key};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct NodeId(usize);

#[derive(Debug)]
enum Slot {
    Child(NodeId),
    Value {
        default: Option<String>,
        resolved: OnceLock<Option<String>>,
    },
}

#[derive(Debug)]
struct Node {
    path: String,
    schema: Arc<Schema>,
    parent: Option<NodeId>,
    slots: Vec<(String, Slot)>,
}

impl Node {
    fn slot(&self, name: &str) -> Option<&Slot> {
        self.slots.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }
}

/// An immutable configuration tree. Cheap to share across threads behind a
/// reference or an `Arc`.
#[derive(Debug)]
pub struct ConfigTree {
    sources: Arc<SourceList>,
    env_prefix: String,
    nodes: Vec<Node>,
    by_path: HashMap<String, NodeId>,
}

impl ConfigTree {
    /// Materialize `schema` rooted at `path`, bound to `sources`.
    pub fn build(sources: impl Into<Arc<SourceList>>, schema: Arc<Schema>, path: &str) -> Self {
        let mut tree = Self {
            sources: sources.into(),
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
            nodes: Vec::new(),
            by_path: HashMap::new(),
        };
        tree.build_node(schema, path.to_string(), None);
        tracing::debug!(root = path, nodes = tree.nodes.len(), "configuration tree built");
        tree
    }

    /// Build from a type implementing [`DescribeSchema`].
    pub fn for_type<T: DescribeSchema>(sources: impl Into<Arc<SourceList>>, path: &str) -> Self {
        Self::build(sources, T::schema(), path)
    }

    /// Prefix named in [`ConfigError::MissingValue`] for fields read at an
    /// empty path (default: `BAT`). Set it to whatever the env source uses.
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = prefix.to_string();
        self
    }

    pub fn env_prefix(&self) -> &str {
        &self.env_prefix
    }

    fn build_node(&mut self, schema: Arc<Schema>, path: String, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            path: path.clone(),
            schema: schema.clone(),
            parent,
            slots: Vec::new(),
        });
        self.by_path.insert(path.clone(), id);

        let mut slots = Vec::with_capacity(schema.fields().len());
        for field in schema.fields() {
            let slot = match field.ty() {
                FieldType::Nested(child) => {
                    let child_path = join_key(Some(&path), field.name());
                    Slot::Child(self.build_node(child.clone(), child_path, Some(id)))
                }
                FieldType::Primitive(_) => Slot::Value {
                    default: field.default().map(str::to_string),
                    resolved: OnceLock::new(),
                },
            };
            slots.push((field.name().to_string(), slot));
        }
        self.nodes[id.0].slots = slots;
        id
    }

    pub fn root(&self) -> Configuration<'_> {
        Configuration {
            tree: self,
            id: NodeId(0),
        }
    }

    /// Look up a node by its full dotted path.
    pub fn node(&self, path: &str) -> Option<Configuration<'_>> {
        self.by_path
            .get(path)
            .map(|&id| Configuration { tree: self, id })
    }

    pub fn sources(&self) -> &SourceList {
        &self.sources
    }

    /// Number of nodes (sections) in the tree, the root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// What a field name resolves to.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry<'t> {
    Section(Configuration<'t>),
    Value(String),
}

/// A handle on one node of a [`ConfigTree`].
#[derive(Clone, Copy)]
pub struct Configuration<'t> {
    tree: &'t ConfigTree,
    id: NodeId,
}

impl<'t> Configuration<'t> {
    fn node(&self) -> &'t Node {
        &self.tree.nodes[self.id.0]
    }

    fn at(&self, id: NodeId) -> Configuration<'t> {
        Configuration {
            tree: self.tree,
            id,
        }
    }

    /// The dotted namespace path of this node.
    pub fn path(&self) -> &'t str {
        &self.node().path
    }

    pub fn schema(&self) -> &'t Schema {
        &self.node().schema
    }

    pub fn parent(&self) -> Option<Configuration<'t>> {
        self.node().parent.map(|id| self.at(id))
    }

    /// Declared field names, in schema order.
    pub fn field_names(&self) -> impl Iterator<Item = &'t str> + 't {
        self.node().slots.iter().map(|(name, _)| name.as_str())
    }

    /// Child sections, in schema order.
    pub fn sections(&self) -> impl Iterator<Item = (&'t str, Configuration<'t>)> + 't {
        let this = *self;
        self.node().slots.iter().filter_map(move |(name, slot)| match slot {
            Slot::Child(id) => Some((name.as_str(), this.at(*id))),
            Slot::Value { .. } => None,
        })
    }

    /// Resolve `name` to a child section or a value.
    pub fn resolve(&self, name: &str) -> Result<Entry<'t>, ConfigError> {
        match self.node().slot(name) {
            Some(Slot::Child(id)) => Ok(Entry::Section(self.at(*id))),
            Some(Slot::Value { default, resolved }) => resolved
                .get_or_init(|| self.lookup(name, default.as_deref()))
                .clone()
                .map(Entry::Value)
                .ok_or_else(|| self.missing(name)),
            // Undeclared names are still answered by the sources.
            None => self
                .lookup(name, None)
                .map(Entry::Value)
                .ok_or_else(|| self.missing(name)),
        }
    }

    /// Resolve `name` to a value. Sections are an error.
    pub fn get(&self, name: &str) -> Result<String, ConfigError> {
        match self.resolve(name)? {
            Entry::Value(v) => Ok(v),
            Entry::Section(_) => Err(ConfigError::NotAValue {
                key: name.to_string(),
                path: self.path().to_string(),
            }),
        }
    }

    /// Like [`get`](Self::get), but a missing value is `Ok(None)`.
    pub fn get_opt(&self, name: &str) -> Result<Option<String>, ConfigError> {
        match self.get(name) {
            Ok(v) => Ok(Some(v)),
            Err(e) if e.is_missing_value() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// The child section `name`.
    pub fn section(&self, name: &str) -> Result<Configuration<'t>, ConfigError> {
        match self.node().slot(name) {
            Some(Slot::Child(id)) => Ok(self.at(*id)),
            _ => Err(ConfigError::NotASection {
                key: name.to_string(),
                path: self.path().to_string(),
            }),
        }
    }

    /// Resolve a dotted path relative to this node, e.g. `"l1.l2.value"`.
    pub fn get_path(&self, dotted: &str) -> Result<String, ConfigError> {
        let (sections, leaf) = match dotted.rsplit_once('.') {
            Some((sections, leaf)) => (Some(sections), leaf),
            None => (None, dotted),
        };
        let mut node = *self;
        for name in sections.into_iter().flat_map(|s| s.split('.')) {
            node = node.section(name)?;
        }
        node.get(leaf)
    }

    fn lookup(&self, name: &str, default: Option<&str>) -> Option<String> {
        let path = self.path();
        let path = (!path.is_empty()).then_some(path);
        self.tree
            .sources
            .get(name, path)
            .or_else(|| default.map(str::to_string))
    }

    fn missing(&self, name: &str) -> ConfigError {
        let path = self.path();
        ConfigError::MissingValue {
            key: name.to_string(),
            path: path.to_string(),
            env_var: env_var_name(name, Some(path), &self.tree.env_prefix),
        }
    }
}

impl PartialEq for Configuration<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl fmt::Debug for Configuration<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("path", &self.path())
            .field("schema", &self.schema().name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::EnvSource;
    use crate::fixtures::test::{layered_schema, map_source};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn tree_with(pairs: &[(&str, &str)]) -> ConfigTree {
        ConfigTree::build(
            SourceList::empty().with(map_source(pairs)),
            layered_schema(),
            "root",
        )
    }

    #[test]
    fn schema_defaults_fill_the_tree() {
        let tree = ConfigTree::build(SourceList::empty(), layered_schema(), "root");
        let cfg = tree.root();
        assert_eq!(cfg.get("value").unwrap(), "root config value");
        assert_eq!(cfg.get_path("l1a.value").unwrap(), "level 1 config A value");
        assert_eq!(cfg.get_path("l1a.l2a.value").unwrap(), "level 2 config A value");
        assert_eq!(cfg.get_path("l1a.l2b.value").unwrap(), "level 2 config B value");
        assert_eq!(cfg.get_path("l1b.value").unwrap(), "level 1 config B value");
        assert_eq!(cfg.get_path("l1b.l2b.value").unwrap(), "level 2 config B value");
    }

    #[test]
    fn building_with_unsatisfiable_fields_succeeds() {
        let tree = ConfigTree::build(SourceList::empty(), layered_schema(), "root");
        let cfg = tree.root();
        let err = cfg.get("nodefault").unwrap_err();
        assert!(err.is_missing_value());
        // Only that field fails; its neighbours still resolve.
        assert_eq!(cfg.get("value").unwrap(), "root config value");
    }

    #[test]
    fn missing_value_error_names_key_path_and_env_var() {
        let tree = ConfigTree::build(SourceList::empty(), layered_schema(), "root");
        let err = tree.root().section("subsection").unwrap().get("key1").unwrap_err();
        match &err {
            ConfigError::MissingValue { key, path, env_var } => {
                assert_eq!(key, "key1");
                assert_eq!(path, "root.subsection");
                assert_eq!(env_var, "ROOT_SUBSECTION_KEY1");
            }
            other => panic!("expected MissingValue, got {other:?}"),
        }
        let msg = err.to_string();
        assert!(msg.contains("root.subsection.key1"));
        assert!(msg.contains("ROOT_SUBSECTION_KEY1"));
    }

    #[test]
    fn source_value_beats_schema_default() {
        let tree = tree_with(&[("root.l1a.l2a.value", "from source")]);
        let cfg = tree.root();
        assert_eq!(cfg.get_path("l1a.l2a.value").unwrap(), "from source");
        // The same schema type mounted elsewhere keeps its default.
        assert_eq!(cfg.get_path("l1b.l2a.value").unwrap(), "level 2 config A value");
    }

    #[test]
    fn nested_read_matches_direct_source_query() {
        let tree = tree_with(&[("root.l1a.l2b.value", "deep")]);
        let direct = tree.sources().get("value", Some("root.l1a.l2b"));
        let via_tree = tree
            .root()
            .section("l1a")
            .unwrap()
            .section("l2b")
            .unwrap()
            .get("value")
            .unwrap();
        assert_eq!(direct.as_deref(), Some(via_tree.as_str()));
    }

    #[test]
    fn sections_resolve_without_source_lookup() {
        // A source claiming a value for the section name must not shadow it.
        let tree = tree_with(&[("root.l1a", "not a section")]);
        match tree.root().resolve("l1a").unwrap() {
            Entry::Section(section) => assert_eq!(section.path(), "root.l1a"),
            other => panic!("expected section, got {other:?}"),
        }
    }

    #[test]
    fn get_on_section_is_an_error() {
        let tree = tree_with(&[]);
        assert!(matches!(
            tree.root().get("l1a"),
            Err(ConfigError::NotAValue { ref key, .. }) if key == "l1a"
        ));
        assert!(matches!(
            tree.root().section("value"),
            Err(ConfigError::NotASection { .. })
        ));
    }

    #[test]
    fn undeclared_names_query_sources() {
        let tree = tree_with(&[("root.extra", "surprise")]);
        assert_eq!(tree.root().get("extra").unwrap(), "surprise");
        assert!(tree.root().get("absent").unwrap_err().is_missing_value());
    }

    #[test]
    fn get_opt_maps_missing_to_none() {
        let tree = tree_with(&[]);
        assert_eq!(tree.root().get_opt("nodefault").unwrap(), None);
        assert_eq!(tree.root().get_opt("value").unwrap().as_deref(), Some("root config value"));
        assert!(tree.root().get_opt("l1a").is_err());
    }

    #[test]
    fn nodes_know_their_paths_and_parents() {
        let tree = tree_with(&[]);
        let l2 = tree.node("root.l1b.l2a").unwrap();
        assert_eq!(l2.path(), "root.l1b.l2a");
        assert_eq!(l2.schema().name(), "Level2ConfigA");
        let l1 = l2.parent().unwrap();
        assert_eq!(l1.path(), "root.l1b");
        assert_eq!(l1.parent().unwrap(), tree.root());
        assert!(tree.root().parent().is_none());
        // root + subsection + 2 * (l1 + 2 * l2)
        assert_eq!(tree.len(), 8);
    }

    #[test]
    fn field_names_and_sections_follow_schema_order() {
        let tree = tree_with(&[]);
        let names: Vec<&str> = tree.root().field_names().collect();
        assert_eq!(names, ["l1a", "l1b", "subsection", "nodefault", "value"]);
        let sections: Vec<&str> = tree.root().sections().map(|(n, _)| n).collect();
        assert_eq!(sections, ["l1a", "l1b", "subsection"]);
    }

    #[test]
    fn empty_root_path_produces_undotted_children() {
        let tree = ConfigTree::build(
            SourceList::empty().with(map_source(&[("l1a.value", "top")])),
            layered_schema(),
            "",
        );
        assert_eq!(tree.node("l1a").unwrap().path(), "l1a");
        assert_eq!(tree.root().get_path("l1a.value").unwrap(), "top");
        let err = tree.root().get("nodefault").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("BAT_NODEFAULT"));
        assert!(msg.contains("or add nodefault to your config file"));
    }

    #[test]
    fn missing_value_names_the_configured_env_prefix() {
        let tree =
            ConfigTree::build(SourceList::empty(), layered_schema(), "").with_env_prefix("MYAPP");
        assert_eq!(tree.env_prefix(), "MYAPP");
        match tree.root().get("nodefault").unwrap_err() {
            ConfigError::MissingValue { env_var, .. } => assert_eq!(env_var, "MYAPP_NODEFAULT"),
            other => panic!("expected MissingValue, got {other:?}"),
        }
        // A non-empty path names the variable itself, whatever the prefix.
        let err = tree.root().section("subsection").unwrap().get("key1").unwrap_err();
        assert!(err.to_string().contains("SUBSECTION_KEY1"));
    }

    #[test]
    fn env_vars_scope_by_node_path() {
        let env = EnvSource::from_vars([(
            "ROOT_L1A_L2B_VALUE".to_string(),
            "from env".to_string(),
        )]);
        let tree = ConfigTree::build(SourceList::empty().with(env), layered_schema(), "root");
        assert_eq!(tree.root().get_path("l1a.l2b.value").unwrap(), "from env");
        assert_eq!(tree.root().get_path("l1b.l2b.value").unwrap(), "level 2 config B value");
    }

    struct Counting(Arc<AtomicUsize>);

    impl Source for Counting {
        fn get(&self, _key: &str, _path: Option<&str>) -> Option<String> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Some("counted".into())
        }
    }

    #[test]
    fn declared_values_are_resolved_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let tree = ConfigTree::build(
            SourceList::empty().with(Counting(calls.clone())),
            layered_schema(),
            "root",
        );
        for _ in 0..3 {
            assert_eq!(tree.root().get("value").unwrap(), "counted");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn concurrent_readers_see_the_same_values() {
        let calls = Arc::new(AtomicUsize::new(0));
        let tree = ConfigTree::build(
            SourceList::empty().with(Counting(calls.clone())),
            layered_schema(),
            "root",
        );
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..50 {
                        assert_eq!(tree.root().get_path("l1a.l2a.value").unwrap(), "counted");
                        assert_eq!(tree.root().get("value").unwrap(), "counted");
                    }
                });
            }
        });
        // One lookup per slot, however many threads raced on it.
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    struct Described;

    impl DescribeSchema for Described {
        fn schema() -> Arc<Schema> {
            Arc::new(Schema::new("Described").value_with_default("key", "described default"))
        }
    }

    #[test]
    fn build_from_describe_schema() {
        let tree = ConfigTree::for_type::<Described>(SourceList::empty(), "app");
        assert_eq!(tree.root().get("key").unwrap(), "described default");
        assert_eq!(tree.root().path(), "app");
    }
}
