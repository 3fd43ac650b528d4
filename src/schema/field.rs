//! Field metadata: declared kinds and per-field descriptors.

use serde_json::{json, Value};

use crate::rules::Constraint;

/// The declared kind of a field's value.
///
/// `Bool`, `Int` and `Float` are primitive kinds: they cannot hold null and
/// default to a zero value. Every other kind is a reference kind defaulting
/// to null.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Bool,
    Int,
    Float,
    Str,
    /// A nested object of the named type.
    Object(String),
    /// An array of elements of the inner kind.
    Array(Box<FieldKind>),
    /// A string-keyed map of values of the inner kind.
    Map(Box<FieldKind>),
    /// Any shape accepted as-is.
    Any,
}

impl FieldKind {
    /// Returns true for kinds that cannot hold null.
    pub fn is_primitive(&self) -> bool {
        matches!(self, FieldKind::Bool | FieldKind::Int | FieldKind::Float)
    }

    /// The value a field of this kind holds when never assigned: a zero
    /// value for primitives, null for reference kinds.
    pub fn default_value(&self) -> Value {
        match self {
            FieldKind::Bool => json!(false),
            FieldKind::Int => json!(0),
            FieldKind::Float => json!(0.0),
            _ => Value::Null,
        }
    }

    /// The kind's display name, used for constructor parameter types in
    /// structural paths.
    pub fn type_name(&self) -> String {
        match self {
            FieldKind::Bool => "bool".to_string(),
            FieldKind::Int => "int".to_string(),
            FieldKind::Float => "float".to_string(),
            FieldKind::Str => "string".to_string(),
            FieldKind::Object(name) => name.clone(),
            FieldKind::Array(inner) => format!("array<{}>", inner.type_name()),
            FieldKind::Map(inner) => format!("map<{}>", inner.type_name()),
            FieldKind::Any => "any".to_string(),
        }
    }
}

/// Metadata for one declared field of a type.
///
/// Built fluently and attached to a
/// [`TypeDescriptor`](crate::schema::TypeDescriptor):
///
/// ```rust
/// use inquest::{Constraint, FieldDescriptor, FieldKind};
///
/// let field = FieldDescriptor::new("email", FieldKind::Str)
///     .constraint(Constraint::not_null())
///     .constraint(Constraint::pattern("@").unwrap());
/// assert_eq!(field.name, "email");
/// ```
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// The wire name the field is addressed by in input.
    pub name: String,
    /// The language-level identifier, when it differs from the wire name.
    /// Reported in structural paths under the `ReportFieldIdentPaths`
    /// feature.
    pub ident: Option<String>,
    /// Declared kind of the field's value.
    pub kind: FieldKind,
    /// Whether the field must be present in input.
    pub required: bool,
    /// Whether validation cascades into the field's value.
    pub cascade: bool,
    /// Declared constraints on the field's value.
    pub constraints: Vec<Constraint>,
    /// Position among creator arguments, when the field is one.
    pub creator_index: Option<usize>,
}

impl FieldDescriptor {
    /// Creates a field descriptor with no constraints.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            ident: None,
            kind,
            required: false,
            cascade: false,
            constraints: Vec::new(),
            creator_index: None,
        }
    }

    /// Marks the field as required in input.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Marks the field for cascaded validation into its value.
    pub fn cascade(mut self) -> Self {
        self.cascade = true;
        self
    }

    /// Sets the language-level identifier.
    pub fn ident(mut self, ident: impl Into<String>) -> Self {
        self.ident = Some(ident.into());
        self
    }

    /// Adds one declared constraint.
    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// The name reported in structural paths.
    pub fn path_name(&self, use_ident: bool) -> &str {
        if use_ident {
            self.ident.as_deref().unwrap_or(&self.name)
        } else {
            &self.name
        }
    }
}
