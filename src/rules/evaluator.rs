//! Rule evaluation against declared schema metadata.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::path::ViolationPath;
use crate::rules::{ParameterFailure, RuleDescriptor};
use crate::schema::TypeDescriptor;

/// One failing rule for a single checked element.
#[derive(Debug, Clone)]
pub struct RuleFailure {
    /// Descriptor of the failed rule.
    pub descriptor: RuleDescriptor,
    /// The offending value.
    pub invalid_value: Option<Value>,
}

impl RuleFailure {
    /// Creates a failure for the given descriptor and value.
    pub fn new(descriptor: RuleDescriptor, invalid_value: Option<Value>) -> Self {
        Self {
            descriptor,
            invalid_value,
        }
    }
}

/// Evaluates declared constraints for a type.
///
/// A collaborator seam (the engine never interprets rule semantics): given
/// a type, an element and a value, an evaluator returns the set of failing
/// rules as descriptors. The bundled [`DeclaredRules`] implementation reads
/// the constraints declared on registered [`TypeDescriptor`]s.
pub trait RuleEvaluator: Send + Sync {
    /// Returns the failing rules for one field's value.
    fn validate_value(&self, type_name: &str, field: &str, value: &Value) -> Vec<RuleFailure>;

    /// Returns group-level failures for a creator's full argument list.
    fn validate_parameters(&self, type_name: &str, args: &[Value]) -> Vec<ParameterFailure>;

    /// Returns whole-object failures for a constructed, populated object.
    /// Each failure carries the path it anchors at.
    fn validate_object(
        &self,
        type_name: &str,
        object: &Map<String, Value>,
    ) -> Vec<(ViolationPath, RuleFailure)>;
}

/// Access to registered type descriptors.
///
/// Abstracts descriptor lookup so the evaluator does not depend on the
/// registry module.
pub trait DescriptorAccess: Send + Sync {
    /// Gets a descriptor by type name.
    fn descriptor(&self, type_name: &str) -> Option<Arc<TypeDescriptor>>;
}

/// The default evaluator: checks the constraints declared on descriptors.
pub struct DeclaredRules {
    access: Arc<dyn DescriptorAccess>,
}

impl DeclaredRules {
    /// Creates an evaluator over the given descriptor source.
    pub fn new(access: Arc<dyn DescriptorAccess>) -> Self {
        Self { access }
    }
}

impl RuleEvaluator for DeclaredRules {
    fn validate_value(&self, type_name: &str, field: &str, value: &Value) -> Vec<RuleFailure> {
        let Some(descriptor) = self.access.descriptor(type_name) else {
            return Vec::new();
        };
        let Some(field) = descriptor.field(field) else {
            return Vec::new();
        };

        field
            .constraints
            .iter()
            .filter(|c| !c.is_satisfied_by(value))
            .map(|c| RuleFailure::new(c.descriptor().clone(), Some(value.clone())))
            .collect()
    }

    fn validate_parameters(&self, type_name: &str, args: &[Value]) -> Vec<ParameterFailure> {
        let Some(descriptor) = self.access.descriptor(type_name) else {
            return Vec::new();
        };

        descriptor
            .creator_constraints()
            .iter()
            .flat_map(|c| c.check(args))
            .collect()
    }

    fn validate_object(
        &self,
        type_name: &str,
        object: &Map<String, Value>,
    ) -> Vec<(ViolationPath, RuleFailure)> {
        let Some(descriptor) = self.access.descriptor(type_name) else {
            return Vec::new();
        };

        descriptor
            .object_constraints()
            .iter()
            .filter(|c| !c.is_satisfied_by(object))
            .map(|c| {
                let (path, invalid) = match c.anchor() {
                    Some(field) => (
                        ViolationPath::of_property(field),
                        object.get(field).cloned(),
                    ),
                    None => (ViolationPath::root(), Some(Value::Object(object.clone()))),
                };
                (path, RuleFailure::new(c.descriptor().clone(), invalid))
            })
            .collect()
    }
}
