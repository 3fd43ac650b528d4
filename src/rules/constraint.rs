//! Declared constraints: per-value, per-creator-group, and per-object.

use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde_json::{Map, Value};

use crate::path::ViolationPath;
use crate::rules::RuleDescriptor;

type ValueCheck = Arc<dyn Fn(&Value) -> bool + Send + Sync>;
type GroupCheck = Arc<dyn Fn(&[Value]) -> Vec<ParameterFailure> + Send + Sync>;
type ObjectCheck = Arc<dyn Fn(&Map<String, Value>) -> bool + Send + Sync>;

/// One declarative constraint on a single value.
///
/// Couples a [`RuleDescriptor`] with the predicate that checks it. Following
/// the usual constraint convention, every built-in rule except `not_null`
/// passes for `null`; absence is the business of `not_null` and the
/// required-field handling, not of value rules.
///
/// # Example
///
/// ```rust
/// use inquest::Constraint;
/// use serde_json::json;
///
/// let rule = Constraint::min_len(3);
/// assert!(rule.is_satisfied_by(&json!("abc")));
/// assert!(!rule.is_satisfied_by(&json!("ab")));
/// assert!(rule.is_satisfied_by(&json!(null)));
/// ```
#[derive(Clone)]
pub struct Constraint {
    descriptor: RuleDescriptor,
    check: ValueCheck,
}

impl Constraint {
    /// The value must not be null.
    pub fn not_null() -> Self {
        Self {
            descriptor: RuleDescriptor::not_null(),
            check: Arc::new(|value| !value.is_null()),
        }
    }

    /// String length must be at least `min` characters.
    pub fn min_len(min: usize) -> Self {
        Self {
            descriptor: RuleDescriptor::declared(
                "min_len",
                format!("must be at least {} characters long", min),
            ),
            check: Arc::new(move |value| match value.as_str() {
                Some(s) => s.chars().count() >= min,
                None => true,
            }),
        }
    }

    /// String length must be at most `max` characters.
    pub fn max_len(max: usize) -> Self {
        Self {
            descriptor: RuleDescriptor::declared(
                "max_len",
                format!("must be at most {} characters long", max),
            ),
            check: Arc::new(move |value| match value.as_str() {
                Some(s) => s.chars().count() <= max,
                None => true,
            }),
        }
    }

    /// String must match the given regular expression.
    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(pattern)?;
        Ok(Self {
            descriptor: RuleDescriptor::declared(
                "pattern",
                format!("must match pattern '{}'", pattern),
            ),
            check: Arc::new(move |value| match value.as_str() {
                Some(s) => regex.is_match(s),
                None => true,
            }),
        })
    }

    /// Integer value must be at least `min`.
    pub fn min(min: i64) -> Self {
        Self {
            descriptor: RuleDescriptor::declared("min", format!("must be at least {}", min)),
            check: Arc::new(move |value| match value.as_i64() {
                Some(n) => n >= min,
                None => true,
            }),
        }
    }

    /// Integer value must be at most `max`.
    pub fn max(max: i64) -> Self {
        Self {
            descriptor: RuleDescriptor::declared("max", format!("must be at most {}", max)),
            check: Arc::new(move |value| match value.as_i64() {
                Some(n) => n <= max,
                None => true,
            }),
        }
    }

    /// A schema-author rule with its own name, message template and check.
    ///
    /// The check receives the value and returns true when satisfied; null
    /// handling is up to the author.
    pub fn custom(
        name: impl Into<String>,
        template: impl Into<String>,
        check: impl Fn(&Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            descriptor: RuleDescriptor::declared(name, template),
            check: Arc::new(check),
        }
    }

    /// Replaces the descriptor's message template.
    pub fn message(mut self, template: impl Into<String>) -> Self {
        self.descriptor = self.descriptor.with_template(template);
        self
    }

    /// The descriptor of this constraint's rule.
    pub fn descriptor(&self) -> &RuleDescriptor {
        &self.descriptor
    }

    /// Checks the value against this constraint.
    pub fn is_satisfied_by(&self, value: &Value) -> bool {
        (self.check)(value)
    }
}

impl fmt::Debug for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constraint")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// One group-level failure reported against a creator parameter.
#[derive(Debug, Clone)]
pub struct ParameterFailure {
    /// Index of the offending parameter.
    pub index: usize,
    /// Descriptor of the failed rule.
    pub descriptor: RuleDescriptor,
    /// The offending value.
    pub invalid_value: Option<Value>,
    /// Optional continuation below the parameter (e.g. a nested field of
    /// the argument), spliced onto the remapped path.
    pub subpath: Option<ViolationPath>,
}

impl ParameterFailure {
    /// Creates a failure at the given parameter index.
    pub fn new(index: usize, descriptor: RuleDescriptor) -> Self {
        Self {
            index,
            descriptor,
            invalid_value: None,
            subpath: None,
        }
    }

    /// Attaches the offending value.
    pub fn with_invalid_value(mut self, value: Value) -> Self {
        self.invalid_value = Some(value);
        self
    }

    /// Attaches a path continuation below the parameter.
    pub fn with_subpath(mut self, subpath: ViolationPath) -> Self {
        self.subpath = Some(subpath);
        self
    }
}

/// A constraint over a creator's full argument list.
///
/// Interdependent-argument rules are legal, so the check sees every
/// argument at once and reports failures by parameter index.
///
/// # Example
///
/// ```rust
/// use inquest::{CreatorConstraint, ParameterFailure, RuleDescriptor};
/// use serde_json::json;
///
/// // end must not precede start
/// let rule = CreatorConstraint::new(|args| {
///     match (args[0].as_i64(), args[1].as_i64()) {
///         (Some(start), Some(end)) if end < start => {
///             vec![ParameterFailure::new(
///                 1,
///                 RuleDescriptor::declared("ordered", "must not precede start"),
///             )
///             .with_invalid_value(args[1].clone())]
///         }
///         _ => vec![],
///     }
/// });
/// assert!(rule.check(&[json!(1), json!(2)]).is_empty());
/// assert_eq!(rule.check(&[json!(2), json!(1)]).len(), 1);
/// ```
#[derive(Clone)]
pub struct CreatorConstraint {
    check: GroupCheck,
}

impl CreatorConstraint {
    /// Creates a group constraint from a check over the argument slice.
    pub fn new(check: impl Fn(&[Value]) -> Vec<ParameterFailure> + Send + Sync + 'static) -> Self {
        Self {
            check: Arc::new(check),
        }
    }

    /// Runs the check against a buffered argument list.
    pub fn check(&self, args: &[Value]) -> Vec<ParameterFailure> {
        (self.check)(args)
    }
}

impl fmt::Debug for CreatorConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreatorConstraint").finish_non_exhaustive()
    }
}

/// A whole-object constraint, checked after construction and population.
#[derive(Clone)]
pub struct ObjectConstraint {
    descriptor: RuleDescriptor,
    check: ObjectCheck,
    anchor: Option<String>,
}

impl ObjectConstraint {
    /// Creates an object constraint from a predicate over the populated
    /// object.
    pub fn new(
        name: impl Into<String>,
        template: impl Into<String>,
        check: impl Fn(&Map<String, Value>) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            descriptor: RuleDescriptor::declared(name, template),
            check: Arc::new(check),
            anchor: None,
        }
    }

    /// Anchors resulting violations at the named field instead of the
    /// object root.
    pub fn at(mut self, field: impl Into<String>) -> Self {
        self.anchor = Some(field.into());
        self
    }

    /// The descriptor of this constraint's rule.
    pub fn descriptor(&self) -> &RuleDescriptor {
        &self.descriptor
    }

    /// The field violations are anchored at, if any.
    pub fn anchor(&self) -> Option<&str> {
        self.anchor.as_deref()
    }

    /// Checks the populated object against this constraint.
    pub fn is_satisfied_by(&self, object: &Map<String, Value>) -> bool {
        (self.check)(object)
    }
}

impl fmt::Debug for ObjectConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectConstraint")
            .field("descriptor", &self.descriptor)
            .field("anchor", &self.anchor)
            .finish_non_exhaustive()
    }
}
