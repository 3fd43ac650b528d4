//! Placeholder for objects that could not be constructed.

use serde_json::Value;

use crate::error::{ConstraintViolation, ViolationCollector, Violations};

/// Stand-in for an object whose creator could not run because its argument
/// validation failed.
///
/// Materialized exactly once, at the moment group validation fails; from
/// then on every field offered to the object is validated but never set,
/// appending to the placeholder's violation set instead. There is no
/// transition back to a real object.
#[derive(Debug)]
pub struct InvalidObject {
    declared_type: String,
    violations: ViolationCollector,
}

impl InvalidObject {
    /// Materializes a placeholder for the declared type, seeded with the
    /// violations that prevented construction. Never created empty.
    pub fn new(declared_type: impl Into<String>, violations: Violations) -> Self {
        let mut collector = ViolationCollector::new();
        collector.extend(violations);
        Self {
            declared_type: declared_type.into(),
            violations: collector,
        }
    }

    /// The type the failed object would have had.
    pub fn declared_type(&self) -> &str {
        &self.declared_type
    }

    /// Appends further violations found while offering remaining fields.
    pub fn add_all(&mut self, violations: impl IntoIterator<Item = ConstraintViolation>) {
        self.violations.extend(violations);
    }

    /// Number of violations held so far.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Always false; a placeholder is never materialized without at least
    /// one violation.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Finalizes the placeholder, freezing and returning its violation set.
    pub fn into_violations(self) -> Violations {
        self.violations
            .finish()
            .expect("InvalidObject always holds at least one violation")
    }
}

/// Outcome of attempting to construct one object.
///
/// An explicit tagged union: either the real value was built, or a
/// placeholder carries the violations that made construction impossible.
#[derive(Debug)]
pub enum ConstructionResult {
    /// The real object was constructed.
    Built(Value),
    /// Construction failed; the placeholder keeps accepting violations.
    Failed(InvalidObject),
}
