//! Construction forms: how a type's instances come into being.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::schema::FieldKind;

/// A creator failure unrelated to validation.
///
/// Raised by user construction code for reasons the engine cannot recover
/// from; it escalates to the caller unchanged, with no placeholder
/// substitution.
#[derive(Debug, Clone, thiserror::Error)]
#[error("constructor failed: {0}")]
pub struct ConstructorError(pub String);

/// Builds an object from a buffered creator argument list.
pub type CreatorFn = Arc<dyn Fn(&[Value]) -> Result<Value, ConstructorError> + Send + Sync>;

/// Builds an object from a single scalar input value.
pub type ScalarFn = Arc<dyn Fn(&Value) -> Result<Value, ConstructorError> + Send + Sync>;

/// Produces the initial field map for default construction.
pub type SeedFn = Arc<dyn Fn() -> Map<String, Value> + Send + Sync>;

/// How a type's instances are constructed.
#[derive(Clone)]
pub enum Construction {
    /// Default construction: an instance exists before any field arrives.
    /// `seed` supplies the initial state; absent, every declared field
    /// starts at its kind's default value.
    Default { seed: Option<SeedFn> },
    /// Creator-based construction: the instance cannot exist until all
    /// named arguments are known. `params` lists argument field names in
    /// positional order.
    Creator { params: Vec<String>, build: CreatorFn },
}

impl Construction {
    /// Default construction with no seed.
    pub fn default_form() -> Self {
        Construction::Default { seed: None }
    }

    /// Default construction seeded by the given producer.
    pub fn seeded(seed: impl Fn() -> Map<String, Value> + Send + Sync + 'static) -> Self {
        Construction::Default {
            seed: Some(Arc::new(seed)),
        }
    }

    /// Creator-based construction with an explicit build function.
    pub fn creator(
        params: impl IntoIterator<Item = String>,
        build: impl Fn(&[Value]) -> Result<Value, ConstructorError> + Send + Sync + 'static,
    ) -> Self {
        Construction::Creator {
            params: params.into_iter().collect(),
            build: Arc::new(build),
        }
    }

    /// Creator-based construction whose build zips arguments into an
    /// object map keyed by parameter name. The common case.
    pub fn creator_to_map(params: impl IntoIterator<Item = String>) -> Self {
        let params: Vec<String> = params.into_iter().collect();
        let keys = params.clone();
        Construction::Creator {
            params,
            build: Arc::new(move |args| {
                let mut object = Map::new();
                for (key, value) in keys.iter().zip(args) {
                    object.insert(key.clone(), value.clone());
                }
                Ok(Value::Object(object))
            }),
        }
    }

    /// Returns the creator parameter names, empty for default construction.
    pub fn params(&self) -> &[String] {
        match self {
            Construction::Default { .. } => &[],
            Construction::Creator { params, .. } => params,
        }
    }

    /// Returns true for the creator-based form.
    pub fn is_creator(&self) -> bool {
        matches!(self, Construction::Creator { .. })
    }
}

impl fmt::Debug for Construction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Construction::Default { seed } => f
                .debug_struct("Default")
                .field("seeded", &seed.is_some())
                .finish(),
            Construction::Creator { params, .. } => f
                .debug_struct("Creator")
                .field("params", params)
                .finish_non_exhaustive(),
        }
    }
}

/// The degenerate single-argument construction form, used when input is a
/// scalar rather than an object.
#[derive(Clone)]
pub struct ScalarConstruction {
    /// Kind the scalar input is bound against.
    pub kind: FieldKind,
    /// Constraints applied to the bound value, as the implicit parameter
    /// at index 0.
    pub constraints: Vec<crate::rules::Constraint>,
    /// Builds the instance from the bound value.
    pub build: ScalarFn,
}

impl ScalarConstruction {
    /// Creates a scalar construction form.
    pub fn new(
        kind: FieldKind,
        constraints: Vec<crate::rules::Constraint>,
        build: impl Fn(&Value) -> Result<Value, ConstructorError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            constraints,
            build: Arc::new(build),
        }
    }
}

impl fmt::Debug for ScalarConstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScalarConstruction")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}
