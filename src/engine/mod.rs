//! The validating construction engine.
//!
//! Composed bottom-up: the [`Binder`](binder::Binder) shape-coerces raw
//! values, [`ValidatedProperty`](property::ValidatedProperty) intercepts a
//! single field, [`ValidatingInstantiator`](instantiator::ValidatingInstantiator)
//! wraps creator invocation, and
//! [`ValidatingDeserializer`](deserializer::ValidatingDeserializer)
//! orchestrates the whole pass. Violations are aggregated throughout;
//! nothing surfaces until the full set for one object is known.

pub mod binder;
pub mod context;
pub mod deserializer;
pub mod instantiator;
pub mod placeholder;
pub mod property;

pub use binder::{BindError, Binder, JsonBinder};
pub use context::{DeserializationContext, RegistryAccess};
pub use deserializer::ValidatingDeserializer;
pub use instantiator::ValidatingInstantiator;
pub use placeholder::{ConstructionResult, InvalidObject};
pub use property::{PropertyOutcome, ValidatedProperty};

use crate::schema::ConstructorError;

/// Hard failures that are not constraint violations.
///
/// Constraint violations travel through `Validation::Failure`; these errors
/// abort the call outright.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// No descriptor registered under the requested type name.
    #[error("type '{0}' not registered")]
    UnknownType(String),

    /// A descriptor with the same type name is already registered.
    #[error("type '{0}' already registered")]
    DuplicateType(String),

    /// Input shape cannot be bound at all and no validation is in effect
    /// to absorb the mismatch.
    #[error("cannot deserialize '{type_name}': expected {expected}, got {got}")]
    MalformedInput {
        type_name: String,
        expected: String,
        got: String,
    },

    /// A required field was absent and no validation is in effect to
    /// absorb the omission.
    #[error("missing required field '{field}' for type '{type_name}'")]
    MissingField { type_name: String, field: String },

    /// Nested type resolution exceeded the depth limit.
    #[error("maximum nesting depth of {0} exceeded")]
    MaxDepthExceeded(usize),

    /// A creator failed for a reason unrelated to validation; escalated
    /// unchanged, with no placeholder substitution.
    #[error(transparent)]
    Construction(#[from] ConstructorError),
}
