//! # Inquest
//!
//! A constraint-validating deserialization engine that aggregates EVERY
//! violation instead of failing fast.
//!
//! ## Overview
//!
//! Inquest consumes self-describing input (`serde_json::Value` trees) and
//! produces either a fully-constructed, validated value or one report
//! carrying every constraint violation found, including failures on
//! fields that arrived after other fields had already failed. Error
//! accumulation rides on stillwater's `Validation` type.
//!
//! The hard case is creator-based construction: when an object is built
//! through a multi-argument creator, individual arguments can fail while
//! the object itself cannot exist yet. Inquest keeps validating everything
//! that remains by substituting a placeholder for the unbuildable object,
//! then reports the merged set with every violation addressed by a
//! structural path.
//!
//! ## Core Types
//!
//! - [`ViolationPath`]: structural location of a violation (e.g. `address.zip`)
//! - [`ConstraintViolation`]: one failure with message, path, rule and value
//! - [`Violations`]: the non-empty aggregated report
//! - [`TypeDescriptor`]: schema metadata for one constructible type
//! - [`TypeRegistry`]: registration and the deserialization entry point
//!
//! ## Example
//!
//! ```rust
//! use inquest::{Constraint, Construction, FieldDescriptor, FieldKind,
//!               TypeDescriptor, TypeRegistry};
//! use serde_json::json;
//!
//! let registry = TypeRegistry::new();
//! registry.register(
//!     TypeDescriptor::builder("Point")
//!         .field(FieldDescriptor::new("x", FieldKind::Int)
//!             .required()
//!             .constraint(Constraint::not_null()))
//!         .field(FieldDescriptor::new("y", FieldKind::Int)
//!             .required()
//!             .constraint(Constraint::not_null()))
//!         .construction(Construction::creator_to_map(["x".to_string(), "y".to_string()]))
//!         .validated()
//!         .build()
//!         .unwrap(),
//! ).unwrap();
//!
//! // x is null and y is absent: both problems are reported, the object
//! // is never constructed.
//! let result = registry.deserialize("Point", &json!({"x": null})).unwrap();
//! let violations = result.into_result().unwrap_err();
//! assert_eq!(violations.len(), 2);
//! ```

pub mod engine;
pub mod error;
pub mod features;
pub mod path;
pub mod registry;
pub mod rules;
pub mod schema;

#[cfg(feature = "parallel")]
pub mod batch;

pub use engine::{
    BindError, Binder, ConstructionResult, DeserializationContext, EngineError, InvalidObject,
    JsonBinder, PropertyOutcome, RegistryAccess, ValidatedProperty, ValidatingDeserializer,
    ValidatingInstantiator,
};
pub use error::{ConstraintViolation, ViolationCollector, Violations};
pub use features::{EngineFeature, FeatureSet};
pub use path::{PathBuilder, PathNode, ViolationPath};
pub use registry::TypeRegistry;
pub use rules::{
    Constraint, CreatorConstraint, DeclaredRules, DefaultInterpolator, DescriptorAccess,
    MessageInterpolator, ObjectConstraint, ParameterFailure, RuleDescriptor, RuleEvaluator,
    RuleFailure, RuleKind,
};
pub use schema::{
    Construction, ConstructorError, CreatorFn, DescriptorError, FieldDescriptor, FieldKind,
    ScalarConstruction, ScalarFn, SeedFn, TypeDescriptor, TypeDescriptorBuilder, ValidatedMarker,
};

/// Type alias for validation outcomes using [`Violations`].
pub type ValidationResult<T> = stillwater::Validation<T, Violations>;
