//! The orchestrating deserializer: drives field consumption, construction
//! and violation aggregation for one type.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use serde_json::{Map, Value};
use stillwater::Validation;

use crate::engine::binder::{json_kind, Binder};
use crate::engine::context::DeserializationContext;
use crate::engine::instantiator::ValidatingInstantiator;
use crate::engine::placeholder::ConstructionResult;
use crate::engine::property::{PropertyOutcome, ValidatedProperty};
use crate::engine::EngineError;
use crate::error::{ConstraintViolation, ViolationCollector, Violations};
use crate::features::{EngineFeature, FeatureSet};
use crate::path::{PathNode, ViolationPath};
use crate::rules::{MessageInterpolator, RuleDescriptor, RuleEvaluator};
use crate::schema::{Construction, TypeDescriptor, ValidatedMarker};

/// Deserializes and validates one registered type.
///
/// One instance exists per registered type. Instances are immutable after
/// resolution (the one-time enable-validation flip happens while they are
/// built) and are safely shared across concurrent top-level calls; all
/// per-call state lives on the stack and in the
/// [`DeserializationContext`].
///
/// Nothing is reported until the full violation set for one object is
/// known: individual field failures are collected, never thrown mid-pass.
pub struct ValidatingDeserializer {
    descriptor: Arc<TypeDescriptor>,
    properties: indexmap::IndexMap<String, ValidatedProperty>,
    instantiator: ValidatingInstantiator,
    evaluator: Arc<dyn RuleEvaluator>,
    interpolator: Arc<dyn MessageInterpolator>,
    features: FeatureSet,
    enabled: bool,
}

impl ValidatingDeserializer {
    /// Resolves the validating machinery for a descriptor.
    ///
    /// Validation is enabled here, exactly once, when the descriptor
    /// carries a marker; a type without one still deserializes, but only
    /// adopts validation when reached through a cascade field.
    pub(crate) fn resolve(
        descriptor: Arc<TypeDescriptor>,
        binder: Arc<dyn Binder>,
        evaluator: Arc<dyn RuleEvaluator>,
        interpolator: Arc<dyn MessageInterpolator>,
        features: FeatureSet,
    ) -> Self {
        let params = descriptor.construction().params();
        let constructor_node = PathNode::Constructor {
            type_name: descriptor.type_name().to_string(),
            param_types: params
                .iter()
                .filter_map(|p| descriptor.field(p))
                .map(|f| f.kind.type_name())
                .collect(),
        };

        let properties = descriptor
            .fields()
            .map(|field| {
                let node = field.creator_index.map(|_| constructor_node.clone());
                (
                    field.name.clone(),
                    ValidatedProperty::new(
                        descriptor.type_name(),
                        field.clone(),
                        node,
                        Arc::clone(&binder),
                        Arc::clone(&evaluator),
                        Arc::clone(&interpolator),
                        features,
                    ),
                )
            })
            .collect();

        let instantiator = ValidatingInstantiator::resolve(
            &descriptor,
            Arc::clone(&binder),
            Arc::clone(&evaluator),
            Arc::clone(&interpolator),
            features,
        );

        let enabled = descriptor.validated().is_some();

        Self {
            descriptor,
            properties,
            instantiator,
            evaluator,
            interpolator,
            features,
            enabled,
        }
    }

    /// The deserialized type's name.
    pub fn type_name(&self) -> &str {
        self.descriptor.type_name()
    }

    /// Whether the one-time enable-validation flip was applied at
    /// resolution.
    pub fn validation_enabled(&self) -> bool {
        self.enabled
    }

    /// Deserializes one input value.
    ///
    /// Returns `Success` with the constructed value, `Failure` with the
    /// complete aggregated violation set, or a hard [`EngineError`] for
    /// failures that are not constraint violations.
    pub fn deserialize(
        &self,
        input: &Value,
        ctx: &DeserializationContext,
    ) -> Result<Validation<Value, Violations>, EngineError> {
        self.deserialize_inner(input, ctx, None)
    }

    /// Deserializes with an inherited marker from a cascading enclosing
    /// type.
    pub(crate) fn deserialize_inner(
        &self,
        input: &Value,
        ctx: &DeserializationContext,
        inherited: Option<&ValidatedMarker>,
    ) -> Result<Validation<Value, Violations>, EngineError> {
        let ctx = ctx.descend()?;
        let marker = if self.enabled {
            self.descriptor.validated().cloned()
        } else {
            inherited.cloned()
        };
        let ctx = ctx.entered(marker.clone());
        let active = marker.is_some();

        match input {
            Value::Object(object) => {
                if self.descriptor.construction().is_creator() {
                    self.deserialize_creator(object, &ctx, marker.as_ref(), active)
                } else {
                    self.deserialize_vanilla(object, &ctx, marker.as_ref(), active)
                }
            }
            other if self.descriptor.scalar().is_some() => {
                match self.instantiator.build_scalar(other, marker.as_ref())? {
                    ConstructionResult::Built(value) => Ok(Validation::Success(value)),
                    ConstructionResult::Failed(placeholder) => {
                        Ok(Validation::Failure(placeholder.into_violations()))
                    }
                }
            }
            other => Err(EngineError::MalformedInput {
                type_name: self.type_name().to_string(),
                expected: "object".to_string(),
                got: json_kind(other).to_string(),
            }),
        }
    }

    /// Default-construction path: the instance exists up front, fields
    /// stream through their wrappers, and the loop never aborts on a
    /// violation.
    fn deserialize_vanilla(
        &self,
        input: &Map<String, Value>,
        ctx: &DeserializationContext,
        marker: Option<&ValidatedMarker>,
        active: bool,
    ) -> Result<Validation<Value, Violations>, EngineError> {
        let mut target = ConstructionResult::Built(Value::Object(self.seed_object()));
        let mut collector = ViolationCollector::new();
        let mut seen: HashSet<&str> = HashSet::new();

        for (name, raw) in input {
            let Some(prop) = self.properties.get(name.as_str()) else {
                continue;
            };
            seen.insert(name.as_str());
            // A failed field is not set, but counts as fully validated.
            collector.extend(prop.deserialize_and_set(raw, &mut target, ctx, marker)?);
        }

        // Fields never encountered kept their construction-time values and
        // have not been through validation yet.
        for prop in self.properties.values() {
            if seen.contains(prop.name()) {
                continue;
            }
            let current = match &target {
                ConstructionResult::Built(Value::Object(object)) => object
                    .get(prop.name())
                    .cloned()
                    .unwrap_or_else(|| prop.field().kind.default_value()),
                _ => prop.field().kind.default_value(),
            };
            collector.extend(prop.validate_current(&current, ctx, marker)?);
        }

        self.finalize(target, collector, active)
    }

    /// Creator-construction path: buffer and individually validate every
    /// creator argument, build (or materialize a placeholder), then run
    /// the remaining fields against whichever target resulted.
    fn deserialize_creator(
        &self,
        input: &Map<String, Value>,
        ctx: &DeserializationContext,
        marker: Option<&ValidatedMarker>,
        active: bool,
    ) -> Result<Validation<Value, Violations>, EngineError> {
        let params = self.descriptor.construction().params();
        let mut args: Vec<Option<Value>> = vec![None; params.len()];
        let mut buffered: BTreeMap<usize, Vec<ConstraintViolation>> = BTreeMap::new();
        let mut late: Vec<(&ValidatedProperty, &Value)> = Vec::new();

        for (name, raw) in input {
            let Some(prop) = self.properties.get(name.as_str()) else {
                continue;
            };
            match prop.creator_index() {
                Some(index) => match prop.deserialize(raw, ctx, marker)? {
                    PropertyOutcome::Resolved(value) => args[index] = Some(value),
                    PropertyOutcome::Invalid(violations) => {
                        buffered.insert(index, violations);
                        // the slot still needs a value so the argument
                        // list stays structurally complete
                        args[index] = Some(prop.field().kind.default_value());
                    }
                },
                None => late.push((prop, raw)),
            }
        }

        self.fill_missing_arguments(&mut args, &mut buffered, marker, active)?;
        let args: Vec<Value> = args
            .into_iter()
            .map(|slot| slot.unwrap_or(Value::Null))
            .collect();

        let mut target = self.instantiator.build(&args, buffered, active)?;

        let mut collector = ViolationCollector::new();
        let mut late_names: HashSet<&str> = HashSet::new();

        for (prop, raw) in late {
            late_names.insert(prop.name());
            collector.extend(prop.deserialize_and_set(raw, &mut target, ctx, marker)?);
        }

        // Declared non-creator fields absent from input: validate what the
        // field would hold, whether or not a real object exists.
        for prop in self.properties.values() {
            if prop.creator_index().is_some() || late_names.contains(prop.name()) {
                continue;
            }
            match &mut target {
                ConstructionResult::Built(Value::Object(object)) => {
                    let current = object
                        .get(prop.name())
                        .cloned()
                        .unwrap_or_else(|| prop.field().kind.default_value());
                    collector.extend(prop.validate_current(&current, ctx, marker)?);
                }
                ConstructionResult::Built(_) => {}
                ConstructionResult::Failed(placeholder) => {
                    let default = prop.field().kind.default_value();
                    let violations = prop.validate_current(&default, ctx, marker)?;
                    placeholder.add_all(violations);
                }
            }
        }

        self.finalize(target, collector, active)
    }

    /// Fills argument slots never seen in input: required ones raise a
    /// synthetic `Required` (or `NotNull`, per feature) violation, and the
    /// slot takes the kind's default value.
    fn fill_missing_arguments(
        &self,
        args: &mut [Option<Value>],
        buffered: &mut BTreeMap<usize, Vec<ConstraintViolation>>,
        marker: Option<&ValidatedMarker>,
        active: bool,
    ) -> Result<(), EngineError> {
        let params = self.descriptor.construction().params();
        for (index, param) in params.iter().enumerate() {
            if args[index].is_some() {
                continue;
            }
            let Some(prop) = self.properties.get(param.as_str()) else {
                continue;
            };
            let field = prop.field();
            if field.required {
                if !active {
                    return Err(EngineError::MissingField {
                        type_name: self.type_name().to_string(),
                        field: param.clone(),
                    });
                }
                let descriptor = if self
                    .features
                    .enabled(EngineFeature::ReportMissingRequiredAsNotNull)
                {
                    RuleDescriptor::not_null()
                } else {
                    let mut descriptor = RuleDescriptor::required();
                    if let Some(template) = marker.and_then(|m| m.required_message.clone()) {
                        descriptor = descriptor.with_template(template);
                    }
                    descriptor
                };
                let use_ident = self.features.enabled(EngineFeature::ReportFieldIdentPaths);
                let violation = ConstraintViolation::create(
                    self.type_name(),
                    None,
                    None,
                    ViolationPath::of_property(field.path_name(use_ident)),
                    None,
                    descriptor,
                    &*self.interpolator,
                );
                buffered.entry(index).or_default().push(violation);
            }
            args[index] = Some(field.kind.default_value());
        }
        Ok(())
    }

    /// Terminal step: run the whole-object check against a real object,
    /// then either report the aggregate or hand the value back.
    fn finalize(
        &self,
        target: ConstructionResult,
        mut collector: ViolationCollector,
        active: bool,
    ) -> Result<Validation<Value, Violations>, EngineError> {
        match target {
            ConstructionResult::Failed(placeholder) => {
                let mut violations = placeholder.into_violations().into_vec();
                for straggler in collector.finish().into_iter().flatten() {
                    if !violations.contains(&straggler) {
                        violations.push(straggler);
                    }
                }
                Ok(Validation::Failure(Violations::from_vec(violations)))
            }
            ConstructionResult::Built(value) => {
                if active
                    && self
                        .features
                        .enabled(EngineFeature::ValidateObjectAfterConstruction)
                {
                    if let Value::Object(object) = &value {
                        for (path, failure) in
                            self.evaluator.validate_object(self.type_name(), object)
                        {
                            collector.insert(ConstraintViolation::create(
                                self.type_name(),
                                Some(value.clone()),
                                Some(value.clone()),
                                path,
                                failure.invalid_value,
                                failure.descriptor,
                                &*self.interpolator,
                            ));
                        }
                    }
                }
                match collector.finish() {
                    Some(violations) => Ok(Validation::Failure(violations)),
                    None => Ok(Validation::Success(value)),
                }
            }
        }
    }

    /// The initial field map for default construction.
    fn seed_object(&self) -> Map<String, Value> {
        match self.descriptor.construction() {
            Construction::Default { seed: Some(seed) } => seed(),
            _ => {
                let mut object = Map::new();
                for field in self.descriptor.fields() {
                    object.insert(field.name.clone(), field.kind.default_value());
                }
                object
            }
        }
    }
}
