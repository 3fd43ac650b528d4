//! Rule descriptors and declared constraints.
//!
//! A [`RuleDescriptor`] identifies one declarative rule together with its
//! message template; [`Constraint`] couples a descriptor with the predicate
//! that checks it. The engine raises three synthetic rules of its own
//! (`NotNull`, `Required`, `ValidInput`) which carry the same interpolation
//! contract as user-declared rules.

mod constraint;
mod evaluator;
mod interpolate;

pub use constraint::{Constraint, CreatorConstraint, ObjectConstraint, ParameterFailure};
pub use evaluator::{DeclaredRules, DescriptorAccess, RuleEvaluator, RuleFailure};
pub use interpolate::{DefaultInterpolator, MessageInterpolator};

use serde_json::Value;

/// The kind of rule a descriptor identifies.
///
/// `NotNull`, `Required` and `ValidInput` are synthetic rules the engine
/// itself raises; `Declared` names a rule declared by the schema author.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RuleKind {
    NotNull,
    Required,
    ValidInput,
    Declared(String),
}

/// Descriptor of one declarative rule: its kind, message template, and the
/// groups/payload metadata a schema author may attach.
///
/// The template is interpolation-ready; `message_template()` never returns
/// an empty string.
///
/// # Example
///
/// ```rust
/// use inquest::{RuleDescriptor, RuleKind};
///
/// let descriptor = RuleDescriptor::not_null();
/// assert_eq!(descriptor.kind(), &RuleKind::NotNull);
/// assert_eq!(descriptor.message_template(), "must not be null");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDescriptor {
    kind: RuleKind,
    template: String,
    groups: Vec<String>,
    payload: Option<Value>,
}

impl RuleDescriptor {
    const NOT_NULL_TEMPLATE: &'static str = "must not be null";
    const REQUIRED_TEMPLATE: &'static str = "is required but was not provided";
    const VALID_INPUT_TEMPLATE: &'static str = "is not valid input";

    /// The synthetic not-null rule.
    pub fn not_null() -> Self {
        Self::of(RuleKind::NotNull, Self::NOT_NULL_TEMPLATE)
    }

    /// The synthetic required-presence rule.
    pub fn required() -> Self {
        Self::of(RuleKind::Required, Self::REQUIRED_TEMPLATE)
    }

    /// The synthetic syntactically-valid-input rule.
    pub fn valid_input() -> Self {
        Self::of(RuleKind::ValidInput, Self::VALID_INPUT_TEMPLATE)
    }

    /// A rule declared by the schema author, with its message template.
    pub fn declared(name: impl Into<String>, template: impl Into<String>) -> Self {
        Self::of(RuleKind::Declared(name.into()), template)
    }

    fn of(kind: RuleKind, template: impl Into<String>) -> Self {
        Self {
            kind,
            template: template.into(),
            groups: Vec::new(),
            payload: None,
        }
    }

    /// Replaces the message template, keeping the rule kind.
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    /// Attaches validation groups.
    pub fn with_groups(mut self, groups: impl IntoIterator<Item = String>) -> Self {
        self.groups = groups.into_iter().collect();
        self
    }

    /// Attaches an opaque payload.
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// The rule kind.
    pub fn kind(&self) -> &RuleKind {
        &self.kind
    }

    /// The rule's display name: `NotNull`, `Required`, `ValidInput`, or the
    /// declared rule's own name.
    pub fn name(&self) -> &str {
        match &self.kind {
            RuleKind::NotNull => "NotNull",
            RuleKind::Required => "Required",
            RuleKind::ValidInput => "ValidInput",
            RuleKind::Declared(name) => name,
        }
    }

    /// The interpolation-ready message template. Never empty.
    pub fn message_template(&self) -> &str {
        &self.template
    }

    /// The validation groups attached to this rule.
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    /// The opaque payload attached to this rule, if any.
    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }
}
