//! Schema descriptions: the shape of a configuration tree and its defaults.
//!
//! A [`Schema`] is an ordered list of named fields. Each field is either a
//! primitive value slot (optionally carrying a default, always as a string) or
//! a nested schema that becomes a child section of the tree.
//!
//! Schemas can be written by hand with the builder methods, declared once per
//! application type through [`DescribeSchema`], or derived from a
//! `#[derive(confique::Config)]` struct with [`Schema::of`].

use std::sync::Arc;

use confique::meta::{Expr, FieldKind, LeafKind, Meta};

/// The declared type of a schema field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    /// A scalar value. The string names the declared type for display only;
    /// resolved values are always strings.
    Primitive(String),
    /// A nested schema, materialized as a child section.
    Nested(Arc<Schema>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    name: String,
    ty: FieldType,
    default: Option<String>,
}

impl Field {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &FieldType {
        &self.ty
    }

    pub fn default(&self) -> Option<&str> {
        self.default.as_deref()
    }

    pub fn is_nested(&self) -> bool {
        matches!(self.ty, FieldType::Nested(_))
    }
}

/// An ordered, immutable description of one configuration level.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    name: String,
    fields: Vec<Field>,
}

/// Implemented by application types that describe their configuration shape.
///
/// ```ignore
/// struct DatabaseConfig;
///
/// impl DescribeSchema for DatabaseConfig {
///     fn schema() -> Arc<Schema> {
///         Arc::new(Schema::new("DatabaseConfig").value("url").value_with_default("pool", "5"))
///     }
/// }
/// ```
pub trait DescribeSchema {
    fn schema() -> Arc<Schema>;
}

impl Schema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Add a primitive field with no default. Reading it fails unless a
    /// source supplies it.
    pub fn value(self, name: impl Into<String>) -> Self {
        self.push(name.into(), FieldType::Primitive("str".into()), None)
    }

    /// Add a primitive field with a default.
    pub fn value_with_default(self, name: impl Into<String>, default: impl Into<String>) -> Self {
        self.push(
            name.into(),
            FieldType::Primitive("str".into()),
            Some(default.into()),
        )
    }

    /// Add a nested section.
    pub fn nested(self, name: impl Into<String>, schema: impl Into<Arc<Schema>>) -> Self {
        self.push(name.into(), FieldType::Nested(schema.into()), None)
    }

    /// Add a field with an explicit type. Defaults on nested fields are dropped.
    pub fn field(self, name: impl Into<String>, ty: FieldType, default: Option<String>) -> Self {
        let default = match ty {
            FieldType::Nested(_) => None,
            FieldType::Primitive(_) => default,
        };
        self.push(name.into(), ty, default)
    }

    // Later declarations replace earlier ones with the same name, keeping the
    // original position.
    fn push(mut self, name: String, ty: FieldType, default: Option<String>) -> Self {
        let field = Field { name, ty, default };
        match self.fields.iter_mut().find(|f| f.name == field.name) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Dotted paths of every primitive field, relative to this schema, in
    /// declaration order.
    pub fn leaf_paths(&self) -> Vec<String> {
        let mut out = Vec::new();
        collect_leaf_paths(self, "", &mut out);
        out
    }

    /// Derive a schema from a confique config struct.
    pub fn of<C: confique::Config>() -> Arc<Schema> {
        Arc::new(Schema::from_meta(&C::META))
    }

    /// Derive a schema from confique metadata.
    ///
    /// `#[config(nested)]` fields become nested sections. Leaf defaults are
    /// rendered to strings; `Option<T>` leaves and leaves without a default
    /// carry none. Array and map defaults have no scalar form and are dropped.
    pub fn from_meta(meta: &Meta) -> Schema {
        let mut schema = Schema::new(meta.name);
        for field in meta.fields {
            schema = match &field.kind {
                FieldKind::Nested { meta, .. } => {
                    schema.nested(field.name, Schema::from_meta(meta))
                }
                FieldKind::Leaf { kind, .. } => {
                    let (type_name, default) = match kind {
                        LeafKind::Required {
                            default: Some(expr),
                            ..
                        } => (expr_type_name(expr), render_expr(expr)),
                        _ => ("value", None),
                    };
                    schema.push(
                        field.name.to_string(),
                        FieldType::Primitive(type_name.into()),
                        default,
                    )
                }
            };
        }
        schema
    }
}

fn collect_leaf_paths(schema: &Schema, prefix: &str, out: &mut Vec<String>) {
    for field in &schema.fields {
        let dotted = if prefix.is_empty() {
            field.name.clone()
        } else {
            format!("{prefix}.{}", field.name)
        };
        match &field.ty {
            FieldType::Primitive(_) => out.push(dotted),
            FieldType::Nested(child) => collect_leaf_paths(child, &dotted, out),
        }
    }
}

fn render_expr(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Str(s) => Some((*s).to_string()),
        Expr::Bool(b) => Some(b.to_string()),
        Expr::Integer(i) => Some(i.to_string()),
        Expr::Float(f) => Some(f.to_string()),
        _ => None,
    }
}

fn expr_type_name(expr: &Expr) -> &'static str {
    match expr {
        Expr::Str(_) => "str",
        Expr::Bool(_) => "bool",
        Expr::Integer(_) => "integer",
        Expr::Float(_) => "float",
        _ => "value",
    }
}
