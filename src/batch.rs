//! Parallel deserialization of independent top-level inputs.
//!
//! One object-construction pass is strictly sequential, but resolved
//! deserializers are immutable and shared, so independent top-level calls
//! can fan out across threads. This module provides that fan-out with
//! rayon, preserving the order of results.

use rayon::prelude::*;
use serde_json::Value;
use stillwater::Validation;

use crate::engine::EngineError;
use crate::error::Violations;
use crate::registry::TypeRegistry;

/// Deserializes every input against the named type in parallel.
///
/// Results come back in input order; each element carries its own outcome,
/// so one input's violations (or hard error) never affect another's.
///
/// # Example
///
/// ```rust
/// use inquest::{Constraint, FieldDescriptor, FieldKind, TypeDescriptor, TypeRegistry};
/// use inquest::batch::deserialize_all;
/// use serde_json::json;
///
/// let registry = TypeRegistry::new();
/// registry.register(
///     TypeDescriptor::builder("User")
///         .field(FieldDescriptor::new("name", FieldKind::Str)
///             .constraint(Constraint::not_null()))
///         .validated()
///         .build()
///         .unwrap(),
/// ).unwrap();
///
/// let inputs = vec![json!({"name": "Alice"}), json!({"name": null})];
/// let results = deserialize_all(&registry, "User", &inputs);
/// assert!(results[0].as_ref().unwrap().is_success());
/// assert!(results[1].as_ref().unwrap().is_failure());
/// ```
pub fn deserialize_all(
    registry: &TypeRegistry,
    type_name: &str,
    inputs: &[Value],
) -> Vec<Result<Validation<Value, Violations>, EngineError>> {
    inputs
        .par_iter()
        .map(|input| registry.deserialize(type_name, input))
        .collect()
}
