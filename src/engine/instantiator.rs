//! Group-level validation around creator invocation.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use crate::engine::binder::{json_kind, BindError, Binder};
use crate::engine::placeholder::{ConstructionResult, InvalidObject};
use crate::engine::EngineError;
use crate::error::{ConstraintViolation, ViolationCollector};
use crate::features::{EngineFeature, FeatureSet};
use crate::path::{PathNode, ViolationPath};
use crate::rules::{MessageInterpolator, ParameterFailure, RuleDescriptor, RuleEvaluator};
use crate::schema::{Construction, CreatorFn, ScalarConstruction, TypeDescriptor, ValidatedMarker};

/// Wraps a type's creator so argument values are validated as a group
/// before the creator runs.
///
/// Per-argument violations found while buffering take precedence over
/// group-level findings for the same parameter index; when the merged set
/// is non-empty the creator never runs and a placeholder is substituted.
pub struct ValidatingInstantiator {
    type_name: String,
    creator: Option<(Vec<String>, CreatorFn)>,
    scalar: Option<ScalarConstruction>,
    /// Wire name and optional identifier per parameter index.
    param_names: Vec<(String, Option<String>)>,
    constructor_node: PathNode,
    binder: Arc<dyn Binder>,
    evaluator: Arc<dyn RuleEvaluator>,
    interpolator: Arc<dyn MessageInterpolator>,
    features: FeatureSet,
    enabled: bool,
}

impl ValidatingInstantiator {
    pub(crate) fn resolve(
        descriptor: &TypeDescriptor,
        binder: Arc<dyn Binder>,
        evaluator: Arc<dyn RuleEvaluator>,
        interpolator: Arc<dyn MessageInterpolator>,
        features: FeatureSet,
    ) -> Self {
        let creator = match descriptor.construction() {
            Construction::Creator { params, build } => {
                Some((params.clone(), Arc::clone(build)))
            }
            Construction::Default { .. } => None,
        };

        let params = descriptor.construction().params();
        let param_names = params
            .iter()
            .map(|p| match descriptor.field(p) {
                Some(field) => (field.name.clone(), field.ident.clone()),
                None => (p.clone(), None),
            })
            .collect();
        let param_types = params
            .iter()
            .filter_map(|p| descriptor.field(p))
            .map(|f| f.kind.type_name())
            .collect();

        Self {
            type_name: descriptor.type_name().to_string(),
            creator,
            scalar: descriptor.scalar().cloned(),
            param_names,
            constructor_node: PathNode::Constructor {
                type_name: descriptor.type_name().to_string(),
                param_types,
            },
            binder,
            evaluator,
            interpolator,
            features,
            enabled: descriptor.validated().is_some(),
        }
    }

    /// Whether the one-time enable-validation flip was applied at
    /// resolution.
    pub fn validation_enabled(&self) -> bool {
        self.enabled
    }

    /// Builds the object from a fully buffered argument list.
    ///
    /// `buffered` holds the violations recorded per parameter index while
    /// the arguments were deserialized; those take precedence over any
    /// group-level finding for the same index.
    pub fn build(
        &self,
        args: &[Value],
        buffered: BTreeMap<usize, Vec<ConstraintViolation>>,
        active: bool,
    ) -> Result<ConstructionResult, EngineError> {
        let Some((params, build)) = &self.creator else {
            return Err(EngineError::MalformedInput {
                type_name: self.type_name.clone(),
                expected: "creator-based construction".to_string(),
                got: "default construction".to_string(),
            });
        };

        let mut collector = ViolationCollector::new();

        if active {
            // Group validation is unsound and redundant when every
            // argument already failed on its own.
            let all_covered = (0..params.len()).all(|i| buffered.contains_key(&i));
            if !all_covered {
                for failure in self.evaluator.validate_parameters(&self.type_name, args) {
                    if buffered.contains_key(&failure.index) {
                        continue;
                    }
                    collector.insert(self.map_parameter_failure(failure));
                }
            }
        }

        for violations in buffered.into_values() {
            collector.extend(violations);
        }

        match collector.finish() {
            Some(violations) => Ok(ConstructionResult::Failed(InvalidObject::new(
                &self.type_name,
                violations,
            ))),
            None => match build(args) {
                Ok(value) => Ok(ConstructionResult::Built(value)),
                Err(err) => Err(EngineError::Construction(err)),
            },
        }
    }

    /// The degenerate single-argument construction form, for scalar input.
    ///
    /// The implicit parameter sits at index 0 and violations identify the
    /// constructed value itself rather than a synthetic parameter name.
    pub fn build_scalar(
        &self,
        raw: &Value,
        marker: Option<&ValidatedMarker>,
    ) -> Result<ConstructionResult, EngineError> {
        let Some(scalar) = &self.scalar else {
            return Err(EngineError::MalformedInput {
                type_name: self.type_name.clone(),
                expected: "object".to_string(),
                got: json_kind(raw).to_string(),
            });
        };
        let active = marker.is_some();

        let bound = match self.binder.bind(&scalar.kind, raw) {
            Ok(v) => v,
            Err(err) => {
                if !active {
                    return Err(EngineError::MalformedInput {
                        type_name: self.type_name.clone(),
                        expected: scalar.kind.type_name(),
                        got: json_kind(raw).to_string(),
                    });
                }
                let violation = self.scalar_bind_violation(&err, marker);
                return Ok(ConstructionResult::Failed(InvalidObject::new(
                    &self.type_name,
                    crate::error::Violations::single(violation),
                )));
            }
        };

        let mut collector = ViolationCollector::new();
        if active {
            for constraint in &scalar.constraints {
                if !constraint.is_satisfied_by(&bound) {
                    collector.insert(ConstraintViolation::create(
                        &self.type_name,
                        None,
                        None,
                        ViolationPath::root(),
                        Some(bound.clone()),
                        constraint.descriptor().clone(),
                        &*self.interpolator,
                    ));
                }
            }
        }

        match collector.finish() {
            Some(violations) => Ok(ConstructionResult::Failed(InvalidObject::new(
                &self.type_name,
                violations,
            ))),
            None => match (scalar.build)(&bound) {
                Ok(value) => Ok(ConstructionResult::Built(value)),
                Err(err) => Err(EngineError::Construction(err)),
            },
        }
    }

    /// Remaps one group-level parameter failure into a reportable
    /// violation, per the feature set's path polarity.
    fn map_parameter_failure(&self, failure: ParameterFailure) -> ConstraintViolation {
        let use_ident = self.features.enabled(EngineFeature::ReportFieldIdentPaths);
        let name = match self.param_names.get(failure.index) {
            Some((wire, ident)) => {
                if use_ident {
                    ident.as_deref().unwrap_or(wire).to_string()
                } else {
                    wire.clone()
                }
            }
            None => format!("arg{}", failure.index),
        };

        let mut builder = if self
            .features
            .enabled(EngineFeature::MapCreatorViolationsToPropertyPaths)
        {
            ViolationPath::builder().append_property(name)
        } else {
            ViolationPath::builder()
                .append_node(self.constructor_node.clone())
                .append_parameter(name, failure.index)
        };
        if let Some(subpath) = &failure.subpath {
            builder = builder.append_path(subpath);
        }

        ConstraintViolation::create(
            &self.type_name,
            None,
            None,
            builder.build(),
            failure.invalid_value,
            failure.descriptor,
            &*self.interpolator,
        )
    }

    fn scalar_bind_violation(
        &self,
        err: &BindError,
        marker: Option<&ValidatedMarker>,
    ) -> ConstraintViolation {
        match err {
            BindError::NullForPrimitive
                if self
                    .features
                    .enabled(EngineFeature::ReportNullPrimitiveAsNotNull) =>
            {
                ConstraintViolation::create(
                    &self.type_name,
                    None,
                    None,
                    ViolationPath::root(),
                    Some(Value::Null),
                    RuleDescriptor::not_null(),
                    &*self.interpolator,
                )
            }
            other => {
                let mut descriptor = RuleDescriptor::valid_input();
                if let Some(template) = marker.and_then(|m| m.valid_input_message.clone()) {
                    descriptor = descriptor.with_template(template);
                }
                ConstraintViolation::create(
                    &self.type_name,
                    None,
                    None,
                    ViolationPath::root(),
                    Some(Value::String(other.text())),
                    descriptor,
                    &*self.interpolator,
                )
            }
        }
    }
}
