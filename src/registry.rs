//! Registry of resolved type deserializers.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use stillwater::Validation;

use crate::engine::{
    Binder, DeserializationContext, EngineError, JsonBinder, RegistryAccess,
    ValidatingDeserializer,
};
use crate::error::Violations;
use crate::features::FeatureSet;
use crate::rules::{
    DeclaredRules, DefaultInterpolator, DescriptorAccess, MessageInterpolator, RuleEvaluator,
};
use crate::schema::TypeDescriptor;

type DescriptorMap = Arc<RwLock<HashMap<String, Arc<TypeDescriptor>>>>;
type DeserializerMap = Arc<RwLock<HashMap<String, Arc<ValidatingDeserializer>>>>;

struct DescriptorStore(DescriptorMap);

impl DescriptorAccess for DescriptorStore {
    fn descriptor(&self, type_name: &str) -> Option<Arc<TypeDescriptor>> {
        self.0.read().get(type_name).cloned()
    }
}

struct DeserializerStore(DeserializerMap);

impl RegistryAccess for DeserializerStore {
    fn deserializer(&self, type_name: &str) -> Option<Arc<ValidatingDeserializer>> {
        self.0.read().get(type_name).cloned()
    }
}

/// A thread-safe registry of type descriptors and their resolved
/// deserializers.
///
/// Registration resolves the validating machinery once, including the
/// one-time enable-validation flip for marked types, and the resolved
/// instances are immutable from then on, so independent top-level
/// `deserialize` calls may run concurrently.
///
/// Configure features, binder and interpolator before registering types;
/// resolution bakes them in.
///
/// # Example
///
/// ```rust
/// use inquest::{Constraint, FieldDescriptor, FieldKind, TypeDescriptor, TypeRegistry};
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
/// let result = registry.deserialize("User", &json!({"name": "Alice"})).unwrap();
/// assert!(result.is_success());
/// ```
pub struct TypeRegistry {
    descriptors: DescriptorMap,
    deserializers: DeserializerMap,
    features: FeatureSet,
    binder: Arc<dyn Binder>,
    interpolator: Arc<dyn MessageInterpolator>,
    evaluator: Arc<dyn RuleEvaluator>,
    max_depth: usize,
}

impl TypeRegistry {
    /// Creates a registry with default features, the JSON shape binder,
    /// the default interpolator, and a nesting limit of 100.
    pub fn new() -> Self {
        let descriptors: DescriptorMap = Arc::new(RwLock::new(HashMap::new()));
        let evaluator = Arc::new(DeclaredRules::new(Arc::new(DescriptorStore(Arc::clone(
            &descriptors,
        )))));
        Self {
            descriptors,
            deserializers: Arc::new(RwLock::new(HashMap::new())),
            features: FeatureSet::default(),
            binder: Arc::new(JsonBinder),
            interpolator: Arc::new(DefaultInterpolator),
            evaluator,
            max_depth: 100,
        }
    }

    /// Replaces the feature set used for subsequently registered types.
    pub fn with_features(mut self, features: FeatureSet) -> Self {
        self.features = features;
        self
    }

    /// Replaces the binder used for subsequently registered types.
    pub fn with_binder(mut self, binder: impl Binder + 'static) -> Self {
        self.binder = Arc::new(binder);
        self
    }

    /// Replaces the message interpolator used for subsequently registered
    /// types.
    pub fn with_interpolator(mut self, interpolator: impl MessageInterpolator + 'static) -> Self {
        self.interpolator = Arc::new(interpolator);
        self
    }

    /// Sets the maximum nesting depth for cascaded deserialization.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Registers a type and resolves its deserializer.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::DuplicateType` if the type name is taken.
    pub fn register(&self, descriptor: TypeDescriptor) -> Result<(), EngineError> {
        let name = descriptor.type_name().to_string();
        let descriptor = Arc::new(descriptor);

        {
            let mut descriptors = self.descriptors.write();
            if descriptors.contains_key(&name) {
                return Err(EngineError::DuplicateType(name));
            }
            descriptors.insert(name.clone(), Arc::clone(&descriptor));
        }

        let deserializer = ValidatingDeserializer::resolve(
            descriptor,
            Arc::clone(&self.binder),
            Arc::clone(&self.evaluator),
            Arc::clone(&self.interpolator),
            self.features,
        );
        self.deserializers
            .write()
            .insert(name, Arc::new(deserializer));
        Ok(())
    }

    /// Retrieves a resolved deserializer by type name.
    pub fn get(&self, type_name: &str) -> Option<Arc<ValidatingDeserializer>> {
        self.deserializers.read().get(type_name).cloned()
    }

    /// Deserializes one input value against a registered type.
    ///
    /// The outer `Result` carries hard failures; the inner `Validation`
    /// carries either the constructed value or the complete aggregated
    /// violation set.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::UnknownType` if the type is not registered,
    /// and propagates hard engine errors from the pass itself.
    pub fn deserialize(
        &self,
        type_name: &str,
        input: &Value,
    ) -> Result<Validation<Value, Violations>, EngineError> {
        let deserializer = self
            .get(type_name)
            .ok_or_else(|| EngineError::UnknownType(type_name.to_string()))?;
        let ctx = DeserializationContext::new(
            Arc::new(DeserializerStore(Arc::clone(&self.deserializers))),
            self.max_depth,
        );
        deserializer.deserialize(input, &ctx)
    }

    /// Returns the names of object types referenced by registered fields
    /// but not themselves registered.
    ///
    /// Lookups happen lazily at deserialization time, so registration
    /// order does not matter; call this after registering everything to
    /// check reference integrity.
    pub fn validate_refs(&self) -> Vec<String> {
        let descriptors = self.descriptors.read();

        let mut unresolved: Vec<String> = descriptors
            .values()
            .flat_map(|d| d.referenced_types())
            .filter(|name| !descriptors.contains_key(name))
            .collect();

        unresolved.sort();
        unresolved.dedup();
        unresolved
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
