//! Constraint violation records and their aggregate.

use std::fmt::{self, Display};

use serde_json::Value;
use stillwater::prelude::*;

use crate::path::ViolationPath;
use crate::rules::{MessageInterpolator, RuleDescriptor, RuleKind};

/// An immutable record of one constraint failure.
///
/// Captures the already-interpolated message, the type (and optionally the
/// value) of the root object being constructed, the structural path to the
/// failing element, the offending value, and the descriptor of the rule
/// that failed.
///
/// Two violations are considered equal when their message, path and invalid
/// value agree; the engine relies on this for set semantics when the same
/// failure is re-derived through two code paths.
#[derive(Debug, Clone)]
pub struct ConstraintViolation {
    /// Human-readable, already-interpolated message.
    pub message: String,
    /// Name of the root type whose construction raised this violation.
    pub root_type: String,
    /// The root object, when one exists. Diagnostic only.
    pub root: Option<Value>,
    /// The object closest to the failing element, when known.
    pub leaf: Option<Value>,
    /// Structural path from the root to the failing element.
    pub path: ViolationPath,
    /// The value that failed the rule.
    pub invalid_value: Option<Value>,
    /// Descriptor of the failed rule.
    pub descriptor: RuleDescriptor,
}

impl ConstraintViolation {
    /// Creates a violation, interpolating the descriptor's message template.
    pub fn create(
        root_type: impl Into<String>,
        root: Option<Value>,
        leaf: Option<Value>,
        path: ViolationPath,
        invalid_value: Option<Value>,
        descriptor: RuleDescriptor,
        interpolator: &dyn MessageInterpolator,
    ) -> Self {
        let message =
            interpolator.interpolate(descriptor.message_template(), invalid_value.as_ref());
        Self {
            message,
            root_type: root_type.into(),
            root,
            leaf,
            path,
            invalid_value,
            descriptor,
        }
    }

    /// Returns a new violation whose path is `base ++ self.path`, without a
    /// duplicated leading root node.
    ///
    /// This is the cascade rule: violations found inside a nested validated
    /// value are reported below the enclosing field's path.
    pub fn with_base_path(&self, base: &ViolationPath) -> Self {
        let mut rebased = self.clone();
        rebased.path = ViolationPath::fragment()
            .append_path(base)
            .append_path(&self.path)
            .build();
        rebased
    }

    /// Returns a new violation with the path replaced outright.
    pub fn with_new_path(&self, path: ViolationPath) -> Self {
        let mut repathed = self.clone();
        repathed.path = path;
        repathed
    }

    /// Returns a new violation rooted at a different object.
    ///
    /// Used when a violation raised against a nested or parameter scope is
    /// promoted to the enclosing object's report.
    pub fn with_root(&self, root_type: impl Into<String>, root: Option<Value>) -> Self {
        let mut rerooted = self.clone();
        rerooted.root_type = root_type.into();
        rerooted.root = root;
        rerooted
    }
}

impl PartialEq for ConstraintViolation {
    fn eq(&self, other: &Self) -> bool {
        self.message == other.message
            && self.path == other.path
            && self.invalid_value == other.invalid_value
    }
}

impl Display for ConstraintViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self.path.to_string();
        if rendered.is_empty() {
            write!(f, "(root): {}", self.message)
        } else {
            write!(f, "{}: {}", rendered, self.message)
        }
    }
}

impl std::error::Error for ConstraintViolation {}

// All fields are owned types, so Send + Sync hold automatically; these
// assertions keep that true if the types change.
const _: () = {
    const fn assert_send<T: Send>() {}
    const fn assert_sync<T: Sync>() {}
    assert_send::<ConstraintViolation>();
    assert_sync::<ConstraintViolation>();
};

/// A non-empty collection of constraint violations.
///
/// Wraps a `NonEmptyVec<ConstraintViolation>` so a failure always carries
/// at least one violation, which is what makes it usable as the error side
/// of `Validation<T, Violations>`.
///
/// # Combining
///
/// `Violations` implements `Semigroup`, so aggregates from independent
/// checks can be merged without losing any entry:
///
/// ```rust
/// use inquest::{ConstraintViolation, RuleDescriptor, ViolationPath, Violations};
/// use inquest::DefaultInterpolator;
/// use stillwater::prelude::*;
///
/// let a = Violations::single(ConstraintViolation::create(
///     "User", None, None, ViolationPath::of_property("name"),
///     None, RuleDescriptor::not_null(), &DefaultInterpolator,
/// ));
/// let b = Violations::single(ConstraintViolation::create(
///     "User", None, None, ViolationPath::of_property("email"),
///     None, RuleDescriptor::required(), &DefaultInterpolator,
/// ));
///
/// assert_eq!(a.combine(b).len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Violations(NonEmptyVec<ConstraintViolation>);

impl Violations {
    /// Creates a `Violations` containing a single violation.
    pub fn single(violation: ConstraintViolation) -> Self {
        Self(NonEmptyVec::singleton(violation))
    }

    /// Creates a `Violations` from a `Vec`.
    ///
    /// # Panics
    ///
    /// Panics if the provided vec is empty.
    pub fn from_vec(violations: Vec<ConstraintViolation>) -> Self {
        Self(NonEmptyVec::from_vec(violations).expect("Violations requires at least one entry"))
    }

    /// Returns the number of violations.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; the collection is guaranteed non-empty.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Returns an iterator over the violations.
    pub fn iter(&self) -> impl Iterator<Item = &ConstraintViolation> {
        self.0.iter()
    }

    /// Returns the first violation.
    pub fn first(&self) -> &ConstraintViolation {
        self.0.head()
    }

    /// Returns all violations at the given structural path.
    pub fn at_path(&self, path: &ViolationPath) -> Vec<&ConstraintViolation> {
        self.0.iter().filter(|v| &v.path == path).collect()
    }

    /// Returns all violations raised by rules of the given kind.
    pub fn of_kind(&self, kind: &RuleKind) -> Vec<&ConstraintViolation> {
        self.0.iter().filter(|v| v.descriptor.kind() == kind).collect()
    }

    /// Converts into a plain `Vec`.
    pub fn into_vec(self) -> Vec<ConstraintViolation> {
        self.0.into_vec()
    }
}

impl Semigroup for Violations {
    fn combine(self, other: Self) -> Self {
        Violations(self.0.combine(other.0))
    }
}

impl Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Validation failed with {} violation(s):", self.len())?;
        for (i, violation) in self.iter().enumerate() {
            writeln!(f, "  {}. {}", i + 1, violation)?;
        }
        Ok(())
    }
}

impl std::error::Error for Violations {}

impl IntoIterator for Violations {
    type Item = ConstraintViolation;
    type IntoIter = std::vec::IntoIter<ConstraintViolation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_vec().into_iter()
    }
}

impl<'a> IntoIterator for &'a Violations {
    type Item = &'a ConstraintViolation;
    type IntoIter = Box<dyn Iterator<Item = &'a ConstraintViolation> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.0.iter())
    }
}

const _: () = {
    const fn assert_send<T: Send>() {}
    const fn assert_sync<T: Sync>() {}
    assert_send::<Violations>();
    assert_sync::<Violations>();
};

/// Order-preserving accumulator with set semantics.
///
/// The engine folds every violation raised during one construction pass
/// into a collector; inserting a violation equal to one already held is a
/// no-op, so a failure re-derived through two code paths is counted once.
#[derive(Debug, Default)]
pub struct ViolationCollector {
    items: Vec<ConstraintViolation>,
}

impl ViolationCollector {
    /// Creates an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts one violation, dropping it if an equal one is already held.
    pub fn insert(&mut self, violation: ConstraintViolation) {
        if !self.items.contains(&violation) {
            self.items.push(violation);
        }
    }

    /// Inserts every violation from an iterator.
    pub fn extend(&mut self, violations: impl IntoIterator<Item = ConstraintViolation>) {
        for violation in violations {
            self.insert(violation);
        }
    }

    /// Returns the number of violations held.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if nothing has been collected.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Finishes the collection: `None` when empty, the aggregate otherwise.
    pub fn finish(self) -> Option<Violations> {
        if self.items.is_empty() {
            None
        } else {
            Some(Violations::from_vec(self.items))
        }
    }
}
