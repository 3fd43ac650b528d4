//! Per-field interception of deserialize-and-set operations.

use std::sync::Arc;

use serde_json::Value;
use stillwater::Validation;

use crate::engine::binder::{json_kind, BindError, Binder};
use crate::engine::context::DeserializationContext;
use crate::engine::placeholder::ConstructionResult;
use crate::engine::EngineError;
use crate::error::ConstraintViolation;
use crate::features::{EngineFeature, FeatureSet};
use crate::path::{PathNode, ViolationPath};
use crate::rules::{MessageInterpolator, RuleDescriptor, RuleEvaluator};
use crate::schema::{FieldDescriptor, FieldKind, ValidatedMarker};

/// The result of offering one field's raw input to its property wrapper.
#[derive(Debug)]
pub enum PropertyOutcome {
    /// The value bound, cascaded and passed every declared rule; it may be
    /// set on the target object.
    Resolved(Value),
    /// The value failed; the violations replace any set-operation.
    Invalid(Vec<ConstraintViolation>),
}

/// Wraps exactly one declared field.
///
/// Binds the raw input, cascades into nested validated types (re-basing
/// nested violations under this field's path), walks array elements and
/// map entries with indexed/keyed path nodes, evaluates the field's
/// declared rules, and converts shape mismatches into synthetic
/// `NotNull`/`ValidInput` violations when validation is in effect.
///
/// Instances are immutable and shared; whether validation applies to a
/// given call is decided by the marker the orchestrator passes in.
pub struct ValidatedProperty {
    owner_type: String,
    field: FieldDescriptor,
    constructor_node: Option<PathNode>,
    binder: Arc<dyn Binder>,
    evaluator: Arc<dyn RuleEvaluator>,
    interpolator: Arc<dyn MessageInterpolator>,
    features: FeatureSet,
}

impl ValidatedProperty {
    pub(crate) fn new(
        owner_type: impl Into<String>,
        field: FieldDescriptor,
        constructor_node: Option<PathNode>,
        binder: Arc<dyn Binder>,
        evaluator: Arc<dyn RuleEvaluator>,
        interpolator: Arc<dyn MessageInterpolator>,
        features: FeatureSet,
    ) -> Self {
        Self {
            owner_type: owner_type.into(),
            field,
            constructor_node,
            binder,
            evaluator,
            interpolator,
            features,
        }
    }

    /// The wrapped field's wire name.
    pub fn name(&self) -> &str {
        &self.field.name
    }

    /// The wrapped field's descriptor.
    pub fn field(&self) -> &FieldDescriptor {
        &self.field
    }

    /// Position among creator arguments, when the field is one.
    pub fn creator_index(&self) -> Option<usize> {
        self.field.creator_index
    }

    /// The structural path violations on this field are reported at.
    ///
    /// Creator arguments keep their constructor/parameter form when the
    /// `MapCreatorViolationsToPropertyPaths` feature is disabled.
    pub fn structural_path(&self) -> ViolationPath {
        let use_ident = self.features.enabled(EngineFeature::ReportFieldIdentPaths);
        let name = self.field.path_name(use_ident);

        if self
            .features
            .disabled(EngineFeature::MapCreatorViolationsToPropertyPaths)
        {
            if let (Some(index), Some(node)) =
                (self.field.creator_index, self.constructor_node.as_ref())
            {
                return ViolationPath::builder()
                    .append_node(node.clone())
                    .append_parameter(name, index)
                    .build();
            }
        }

        ViolationPath::of_property(name)
    }

    /// Deserializes one raw input value for this field.
    ///
    /// With a marker in effect, every failure becomes violations in the
    /// outcome; without one, shape mismatches are hard errors.
    pub fn deserialize(
        &self,
        raw: &Value,
        ctx: &DeserializationContext,
        marker: Option<&ValidatedMarker>,
    ) -> Result<PropertyOutcome, EngineError> {
        let active = marker.is_some();
        let path = self.structural_path();

        let bound = match self.binder.bind(&self.field.kind, raw) {
            Ok(v) => v,
            Err(err) => {
                if active {
                    return Ok(PropertyOutcome::Invalid(vec![self.bind_violation(
                        &err,
                        marker,
                        path,
                    )]));
                }
                return Err(self.malformed(raw));
            }
        };

        let value = match self.resolve_bound(bound, &path, ctx, marker)? {
            Ok(v) => v,
            Err(violations) => return Ok(PropertyOutcome::Invalid(violations)),
        };

        if !active {
            return Ok(PropertyOutcome::Resolved(value));
        }

        let violations = self.evaluate_rules(&value, &path);
        if violations.is_empty() {
            Ok(PropertyOutcome::Resolved(value))
        } else {
            Ok(PropertyOutcome::Invalid(violations))
        }
    }

    /// Deserializes one raw value and applies the set-operation contract.
    ///
    /// A placeholder target never has anything set: the value is
    /// deserialized for validation only and its violations append to the
    /// placeholder. A real target receives the resolved value; on a rule
    /// failure it stays untouched while the violations are handed back
    /// to the caller for aggregation.
    pub fn deserialize_and_set(
        &self,
        raw: &Value,
        target: &mut ConstructionResult,
        ctx: &DeserializationContext,
        marker: Option<&ValidatedMarker>,
    ) -> Result<Vec<ConstraintViolation>, EngineError> {
        match self.deserialize(raw, ctx, marker)? {
            PropertyOutcome::Resolved(value) => {
                self.store(target, value);
                Ok(Vec::new())
            }
            PropertyOutcome::Invalid(violations) => match target {
                ConstructionResult::Failed(placeholder) => {
                    placeholder.add_all(violations);
                    Ok(Vec::new())
                }
                ConstructionResult::Built(_) => Ok(violations),
            },
        }
    }

    /// Applies the set-operation contract to an already-produced value.
    ///
    /// Same placeholder-interception rule as [`deserialize_and_set`]
    /// without the deserialization step.
    ///
    /// [`deserialize_and_set`]: ValidatedProperty::deserialize_and_set
    pub fn set(
        &self,
        target: &mut ConstructionResult,
        value: Value,
        ctx: &DeserializationContext,
        marker: Option<&ValidatedMarker>,
    ) -> Result<Vec<ConstraintViolation>, EngineError> {
        let violations = self.validate_current(&value, ctx, marker)?;
        match target {
            ConstructionResult::Failed(placeholder) => {
                placeholder.add_all(violations);
                Ok(Vec::new())
            }
            ConstructionResult::Built(_) => {
                if violations.is_empty() {
                    self.store(target, value);
                }
                Ok(violations)
            }
        }
    }

    fn store(&self, target: &mut ConstructionResult, value: Value) {
        if let ConstructionResult::Built(Value::Object(object)) = target {
            object.insert(self.field.name.clone(), value);
        }
    }

    /// Validates an already-produced value for this field, without setting
    /// anything.
    ///
    /// Used for fields absent from input: the value checked is whatever
    /// the field currently holds (its kind's default, unless construction
    /// seeded it). Cascades into a non-null nested value.
    pub fn validate_current(
        &self,
        value: &Value,
        ctx: &DeserializationContext,
        marker: Option<&ValidatedMarker>,
    ) -> Result<Vec<ConstraintViolation>, EngineError> {
        if marker.is_none() {
            return Ok(Vec::new());
        }
        let path = self.structural_path();
        let mut violations = self.evaluate_rules(value, &path);

        if !value.is_null() {
            if let FieldKind::Object(type_name) = &self.field.kind {
                if let Err(nested) = self.resolve_nested(type_name, value.clone(), &path, ctx)? {
                    violations.extend(nested);
                }
            }
        }

        Ok(violations)
    }

    /// Resolves container elements and nested objects of a bound value.
    fn resolve_bound(
        &self,
        bound: Value,
        path: &ViolationPath,
        ctx: &DeserializationContext,
        marker: Option<&ValidatedMarker>,
    ) -> Result<Result<Value, Vec<ConstraintViolation>>, EngineError> {
        match &self.field.kind {
            FieldKind::Object(type_name) => self.resolve_nested(type_name, bound, path, ctx),
            FieldKind::Array(inner) => {
                let items = match bound {
                    Value::Array(items) => items,
                    other => return Ok(Ok(other)),
                };
                let mut resolved = Vec::with_capacity(items.len());
                let mut violations = Vec::new();
                for (index, item) in items.into_iter().enumerate() {
                    let use_ident = self.features.enabled(EngineFeature::ReportFieldIdentPaths);
                    let element_path = ViolationPath::builder()
                        .append_indexed_property(self.field.path_name(use_ident), index)
                        .build();
                    match self.resolve_element(inner, item, element_path, ctx, marker)? {
                        Ok(v) => resolved.push(v),
                        Err(vs) => violations.extend(vs),
                    }
                }
                if violations.is_empty() {
                    Ok(Ok(Value::Array(resolved)))
                } else {
                    Ok(Err(violations))
                }
            }
            FieldKind::Map(inner) => {
                let entries = match bound {
                    Value::Object(entries) => entries,
                    other => return Ok(Ok(other)),
                };
                let mut resolved = serde_json::Map::new();
                let mut violations = Vec::new();
                for (key, item) in entries {
                    let use_ident = self.features.enabled(EngineFeature::ReportFieldIdentPaths);
                    let element_path = ViolationPath::builder()
                        .append_keyed_property(self.field.path_name(use_ident), key.clone())
                        .build();
                    match self.resolve_element(inner, item, element_path, ctx, marker)? {
                        Ok(v) => {
                            resolved.insert(key, v);
                        }
                        Err(vs) => violations.extend(vs),
                    }
                }
                if violations.is_empty() {
                    Ok(Ok(Value::Object(resolved)))
                } else {
                    Ok(Err(violations))
                }
            }
            _ => Ok(Ok(bound)),
        }
    }

    /// Resolves one array element or map entry.
    fn resolve_element(
        &self,
        inner: &FieldKind,
        item: Value,
        element_path: ViolationPath,
        ctx: &DeserializationContext,
        marker: Option<&ValidatedMarker>,
    ) -> Result<Result<Value, Vec<ConstraintViolation>>, EngineError> {
        match self.binder.bind(inner, &item) {
            Ok(bound) => {
                if let FieldKind::Object(type_name) = inner {
                    self.resolve_nested(type_name, bound, &element_path, ctx)
                } else {
                    Ok(Ok(bound))
                }
            }
            Err(err) => {
                if marker.is_some() {
                    Ok(Err(vec![self.bind_violation(&err, marker, element_path)]))
                } else {
                    Err(self.malformed(&item))
                }
            }
        }
    }

    /// Deserializes a nested object value through its registered
    /// deserializer; failures come back re-based under this field's path
    /// and re-rooted at the owning type.
    fn resolve_nested(
        &self,
        type_name: &str,
        value: Value,
        base: &ViolationPath,
        ctx: &DeserializationContext,
    ) -> Result<Result<Value, Vec<ConstraintViolation>>, EngineError> {
        if value.is_null() {
            return Ok(Ok(value));
        }
        let Some(nested) = ctx.registry().deserializer(type_name) else {
            return Ok(Ok(value));
        };

        // A cascade field adopts the innermost in-effect marker for nested
        // types that carry none of their own.
        let inherited = if self.field.cascade {
            ctx.innermost_marker()
        } else {
            None
        };

        match nested.deserialize_inner(&value, ctx, inherited)? {
            Validation::Success(v) => Ok(Ok(v)),
            Validation::Failure(violations) => Ok(Err(violations
                .into_iter()
                .map(|v| v.with_base_path(base).with_root(&self.owner_type, None))
                .collect())),
        }
    }

    fn evaluate_rules(&self, value: &Value, path: &ViolationPath) -> Vec<ConstraintViolation> {
        self.evaluator
            .validate_value(&self.owner_type, &self.field.name, value)
            .into_iter()
            .map(|failure| {
                ConstraintViolation::create(
                    &self.owner_type,
                    None,
                    None,
                    path.clone(),
                    failure.invalid_value,
                    failure.descriptor,
                    &*self.interpolator,
                )
            })
            .collect()
    }

    /// Converts a shape mismatch into the synthetic violation the feature
    /// set prescribes.
    fn bind_violation(
        &self,
        err: &BindError,
        marker: Option<&ValidatedMarker>,
        path: ViolationPath,
    ) -> ConstraintViolation {
        match err {
            BindError::NullForPrimitive
                if self
                    .features
                    .enabled(EngineFeature::ReportNullPrimitiveAsNotNull) =>
            {
                ConstraintViolation::create(
                    &self.owner_type,
                    None,
                    None,
                    path,
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
                    &self.owner_type,
                    None,
                    None,
                    path,
                    Some(Value::String(other.text())),
                    descriptor,
                    &*self.interpolator,
                )
            }
        }
    }

    fn malformed(&self, raw: &Value) -> EngineError {
        EngineError::MalformedInput {
            type_name: self.owner_type.clone(),
            expected: self.field.kind.type_name(),
            got: json_kind(raw).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::context::RegistryAccess;
    use crate::engine::deserializer::ValidatingDeserializer;
    use crate::engine::JsonBinder;
    use crate::rules::{DefaultInterpolator, ParameterFailure, RuleFailure, RuleKind};
    use serde_json::json;

    struct NoRegistry;

    impl RegistryAccess for NoRegistry {
        fn deserializer(&self, _: &str) -> Option<Arc<ValidatingDeserializer>> {
            None
        }
    }

    struct NoRules;

    impl RuleEvaluator for NoRules {
        fn validate_value(&self, _: &str, _: &str, _: &Value) -> Vec<RuleFailure> {
            Vec::new()
        }
        fn validate_parameters(&self, _: &str, _: &[Value]) -> Vec<ParameterFailure> {
            Vec::new()
        }
        fn validate_object(
            &self,
            _: &str,
            _: &serde_json::Map<String, Value>,
        ) -> Vec<(ViolationPath, RuleFailure)> {
            Vec::new()
        }
    }

    struct AlwaysNotNullOnNull;

    impl RuleEvaluator for AlwaysNotNullOnNull {
        fn validate_value(&self, _: &str, _: &str, value: &Value) -> Vec<RuleFailure> {
            if value.is_null() {
                vec![RuleFailure::new(RuleDescriptor::not_null(), Some(Value::Null))]
            } else {
                Vec::new()
            }
        }
        fn validate_parameters(&self, _: &str, _: &[Value]) -> Vec<ParameterFailure> {
            Vec::new()
        }
        fn validate_object(
            &self,
            _: &str,
            _: &serde_json::Map<String, Value>,
        ) -> Vec<(ViolationPath, RuleFailure)> {
            Vec::new()
        }
    }

    fn property(field: FieldDescriptor, evaluator: Arc<dyn RuleEvaluator>) -> ValidatedProperty {
        ValidatedProperty::new(
            "Widget",
            field,
            None,
            Arc::new(JsonBinder),
            evaluator,
            Arc::new(DefaultInterpolator),
            FeatureSet::default(),
        )
    }

    fn ctx() -> DeserializationContext {
        DeserializationContext::new(Arc::new(NoRegistry), 16)
    }

    #[test]
    fn test_resolves_valid_value() {
        let prop = property(
            FieldDescriptor::new("name", FieldKind::Str),
            Arc::new(NoRules),
        );
        let marker = ValidatedMarker::new();
        let outcome = prop
            .deserialize(&json!("ok"), &ctx(), Some(&marker))
            .unwrap();
        assert!(matches!(outcome, PropertyOutcome::Resolved(v) if v == json!("ok")));
    }

    #[test]
    fn test_rule_failure_becomes_violation_at_field_path() {
        let prop = property(
            FieldDescriptor::new("name", FieldKind::Str),
            Arc::new(AlwaysNotNullOnNull),
        );
        let marker = ValidatedMarker::new();
        let outcome = prop
            .deserialize(&json!(null), &ctx(), Some(&marker))
            .unwrap();
        match outcome {
            PropertyOutcome::Invalid(vs) => {
                assert_eq!(vs.len(), 1);
                assert_eq!(vs[0].path.to_string(), "name");
                assert_eq!(vs[0].descriptor.kind(), &RuleKind::NotNull);
            }
            other => panic!("expected invalid outcome, got {:?}", other),
        }
    }

    #[test]
    fn test_null_primitive_becomes_notnull_violation() {
        let prop = property(
            FieldDescriptor::new("age", FieldKind::Int),
            Arc::new(NoRules),
        );
        let marker = ValidatedMarker::new();
        let outcome = prop
            .deserialize(&json!(null), &ctx(), Some(&marker))
            .unwrap();
        match outcome {
            PropertyOutcome::Invalid(vs) => {
                assert_eq!(vs[0].descriptor.kind(), &RuleKind::NotNull);
                assert_eq!(vs[0].invalid_value, Some(Value::Null));
            }
            other => panic!("expected invalid outcome, got {:?}", other),
        }
    }

    #[test]
    fn test_shape_mismatch_becomes_valid_input_violation() {
        let prop = property(
            FieldDescriptor::new("age", FieldKind::Int),
            Arc::new(NoRules),
        );
        let marker = ValidatedMarker::new();
        let outcome = prop
            .deserialize(&json!("abc"), &ctx(), Some(&marker))
            .unwrap();
        match outcome {
            PropertyOutcome::Invalid(vs) => {
                assert_eq!(vs[0].descriptor.kind(), &RuleKind::ValidInput);
                assert_eq!(vs[0].invalid_value, Some(json!("abc")));
            }
            other => panic!("expected invalid outcome, got {:?}", other),
        }
    }

    #[test]
    fn test_shape_mismatch_without_marker_is_hard_error() {
        let prop = property(
            FieldDescriptor::new("age", FieldKind::Int),
            Arc::new(NoRules),
        );
        let result = prop.deserialize(&json!("abc"), &ctx(), None);
        assert!(matches!(result, Err(EngineError::MalformedInput { .. })));
    }

    #[test]
    fn test_array_elements_report_indexed_paths() {
        let prop = property(
            FieldDescriptor::new("ages", FieldKind::Array(Box::new(FieldKind::Int))),
            Arc::new(NoRules),
        );
        let marker = ValidatedMarker::new();
        let outcome = prop
            .deserialize(&json!([1, "x", 3, null]), &ctx(), Some(&marker))
            .unwrap();
        match outcome {
            PropertyOutcome::Invalid(vs) => {
                assert_eq!(vs.len(), 2);
                assert_eq!(vs[0].path.to_string(), "ages[1]");
                assert_eq!(vs[1].path.to_string(), "ages[3]");
            }
            other => panic!("expected invalid outcome, got {:?}", other),
        }
    }

    #[test]
    fn test_map_entries_report_keyed_paths() {
        let prop = property(
            FieldDescriptor::new("scores", FieldKind::Map(Box::new(FieldKind::Int))),
            Arc::new(NoRules),
        );
        let marker = ValidatedMarker::new();
        let outcome = prop
            .deserialize(&json!({"alice": 3, "bob": "x"}), &ctx(), Some(&marker))
            .unwrap();
        match outcome {
            PropertyOutcome::Invalid(vs) => {
                assert_eq!(vs.len(), 1);
                assert_eq!(vs[0].path.to_string(), "scores[bob]");
            }
            other => panic!("expected invalid outcome, got {:?}", other),
        }
    }

    #[test]
    fn test_creator_parameter_path_when_mapping_disabled() {
        let field = FieldDescriptor::new("x", FieldKind::Int);
        let mut field = field;
        field.creator_index = Some(0);
        let prop = ValidatedProperty::new(
            "Point",
            field,
            Some(PathNode::Constructor {
                type_name: "Point".into(),
                param_types: vec!["int".into()],
            }),
            Arc::new(JsonBinder),
            Arc::new(NoRules),
            Arc::new(DefaultInterpolator),
            FeatureSet::default()
                .without(EngineFeature::MapCreatorViolationsToPropertyPaths),
        );
        assert_eq!(prop.structural_path().to_string(), "Point.x");
    }

    #[test]
    fn test_ident_paths_feature() {
        let prop = ValidatedProperty::new(
            "Widget",
            FieldDescriptor::new("user_name", FieldKind::Str).ident("userName"),
            None,
            Arc::new(JsonBinder),
            Arc::new(NoRules),
            Arc::new(DefaultInterpolator),
            FeatureSet::default().with(EngineFeature::ReportFieldIdentPaths),
        );
        assert_eq!(prop.structural_path().to_string(), "userName");
    }

    #[test]
    fn test_set_intercepts_placeholder_target() {
        use crate::engine::placeholder::InvalidObject;
        use crate::error::Violations;

        let prop = property(
            FieldDescriptor::new("name", FieldKind::Str),
            Arc::new(AlwaysNotNullOnNull),
        );
        let marker = ValidatedMarker::new();

        let seed = ConstraintViolation::create(
            "Widget",
            None,
            None,
            ViolationPath::of_property("other"),
            None,
            RuleDescriptor::required(),
            &DefaultInterpolator,
        );
        let mut target =
            ConstructionResult::Failed(InvalidObject::new("Widget", Violations::single(seed)));

        // the placeholder absorbs the violation; nothing is returned
        let returned = prop
            .set(&mut target, json!(null), &ctx(), Some(&marker))
            .unwrap();
        assert!(returned.is_empty());
        match target {
            ConstructionResult::Failed(placeholder) => assert_eq!(placeholder.len(), 2),
            ConstructionResult::Built(_) => panic!("placeholder must not become real"),
        }
    }

    #[test]
    fn test_set_on_real_target_stores_or_reports() {
        let prop = property(
            FieldDescriptor::new("name", FieldKind::Str),
            Arc::new(AlwaysNotNullOnNull),
        );
        let marker = ValidatedMarker::new();
        let mut target = ConstructionResult::Built(json!({}));

        let returned = prop
            .set(&mut target, json!("ok"), &ctx(), Some(&marker))
            .unwrap();
        assert!(returned.is_empty());

        let returned = prop
            .set(&mut target, json!(null), &ctx(), Some(&marker))
            .unwrap();
        assert_eq!(returned.len(), 1);

        match target {
            ConstructionResult::Built(value) => {
                // the valid value was stored; the invalid one was not
                assert_eq!(value, json!({"name": "ok"}));
            }
            ConstructionResult::Failed(_) => panic!("expected real target"),
        }
    }

    #[test]
    fn test_validate_current_without_marker_is_empty() {
        let prop = property(
            FieldDescriptor::new("name", FieldKind::Str),
            Arc::new(AlwaysNotNullOnNull),
        );
        let violations = prop.validate_current(&json!(null), &ctx(), None).unwrap();
        assert!(violations.is_empty());
    }

    #[test]
    fn test_validate_current_checks_default() {
        let prop = property(
            FieldDescriptor::new("name", FieldKind::Str),
            Arc::new(AlwaysNotNullOnNull),
        );
        let marker = ValidatedMarker::new();
        let violations = prop
            .validate_current(&json!(null), &ctx(), Some(&marker))
            .unwrap();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path.to_string(), "name");
    }
}
