//! Integration tests for every feature toggle polarity.

use inquest::{
    Constraint, Construction, EngineFeature, FeatureSet, FieldDescriptor, FieldKind,
    ObjectConstraint, RuleKind, TypeDescriptor, TypeRegistry, Violations,
};
use serde_json::{json, Value};
use stillwater::Validation;

fn unwrap_failure(v: Validation<Value, Violations>) -> Violations {
    v.into_result().unwrap_err()
}

fn point_descriptor() -> TypeDescriptor {
    TypeDescriptor::builder("Point")
        .field(
            FieldDescriptor::new("x", FieldKind::Int)
                .ident("abscissa")
                .required()
                .constraint(Constraint::not_null()),
        )
        .field(
            FieldDescriptor::new("y", FieldKind::Int)
                .required()
                .constraint(Constraint::not_null()),
        )
        .construction(Construction::creator_to_map(["x".to_string(), "y".to_string()]))
        .validated()
        .build()
        .unwrap()
}

#[test]
fn test_field_ident_paths_off_by_default() {
    let registry = TypeRegistry::new();
    registry.register(point_descriptor()).unwrap();

    let result = registry
        .deserialize("Point", &json!({"x": null, "y": 1}))
        .unwrap();
    let violations = unwrap_failure(result);
    assert_eq!(violations.first().path.to_string(), "x");
}

#[test]
fn test_field_ident_paths_on() {
    let registry = TypeRegistry::new()
        .with_features(FeatureSet::default().with(EngineFeature::ReportFieldIdentPaths));
    registry.register(point_descriptor()).unwrap();

    let result = registry
        .deserialize("Point", &json!({"x": null, "y": 1}))
        .unwrap();
    let violations = unwrap_failure(result);
    assert_eq!(violations.first().path.to_string(), "abscissa");
}

#[test]
fn test_missing_required_reports_required_by_default() {
    let registry = TypeRegistry::new();
    registry.register(point_descriptor()).unwrap();

    let result = registry.deserialize("Point", &json!({"x": 1})).unwrap();
    let violations = unwrap_failure(result);
    assert_eq!(violations.len(), 1);
    assert_eq!(violations.first().descriptor.kind(), &RuleKind::Required);
}

#[test]
fn test_missing_required_as_notnull_when_enabled() {
    let registry = TypeRegistry::new().with_features(
        FeatureSet::default().with(EngineFeature::ReportMissingRequiredAsNotNull),
    );
    registry.register(point_descriptor()).unwrap();

    let result = registry.deserialize("Point", &json!({"x": 1})).unwrap();
    let violations = unwrap_failure(result);
    assert_eq!(violations.len(), 1);
    assert_eq!(violations.first().descriptor.kind(), &RuleKind::NotNull);
}

#[test]
fn test_null_primitive_reports_notnull_by_default() {
    let registry = TypeRegistry::new();
    registry.register(point_descriptor()).unwrap();

    let result = registry
        .deserialize("Point", &json!({"x": null, "y": 1}))
        .unwrap();
    let violations = unwrap_failure(result);
    assert_eq!(violations.first().descriptor.kind(), &RuleKind::NotNull);
    assert_eq!(violations.first().invalid_value, Some(Value::Null));
}

#[test]
fn test_null_primitive_reports_valid_input_when_disabled() {
    let registry = TypeRegistry::new().with_features(
        FeatureSet::default().without(EngineFeature::ReportNullPrimitiveAsNotNull),
    );
    registry.register(point_descriptor()).unwrap();

    let result = registry
        .deserialize("Point", &json!({"x": null, "y": 1}))
        .unwrap();
    let violations = unwrap_failure(result);
    assert_eq!(violations.first().descriptor.kind(), &RuleKind::ValidInput);
    // the literal textual form of the offending input
    assert_eq!(violations.first().invalid_value, Some(json!("null")));
}

#[test]
fn test_creator_violations_map_to_property_paths_by_default() {
    let registry = TypeRegistry::new();
    registry.register(point_descriptor()).unwrap();

    let result = registry
        .deserialize("Point", &json!({"x": null, "y": null}))
        .unwrap();
    let violations = unwrap_failure(result);
    let paths: Vec<_> = violations.iter().map(|v| v.path.to_string()).collect();
    assert_eq!(paths, vec!["x", "y"]);
}

#[test]
fn test_creator_violations_keep_parameter_paths_when_disabled() {
    let registry = TypeRegistry::new().with_features(
        FeatureSet::default().without(EngineFeature::MapCreatorViolationsToPropertyPaths),
    );
    registry.register(point_descriptor()).unwrap();

    let result = registry
        .deserialize("Point", &json!({"x": null, "y": null}))
        .unwrap();
    let violations = unwrap_failure(result);

    let paths: Vec<_> = violations.iter().map(|v| v.path.to_string()).collect();
    assert_eq!(paths, vec!["Point.x", "Point.y"]);
    assert!(violations.iter().all(|v| v.path.first_parameter().is_some()));
}

#[test]
fn test_object_validation_runs_by_default_and_can_be_disabled() {
    let descriptor = || {
        TypeDescriptor::builder("Pair")
            .field(FieldDescriptor::new("low", FieldKind::Int))
            .field(FieldDescriptor::new("high", FieldKind::Int))
            .object_constraint(ObjectConstraint::new(
                "ordered",
                "low must not exceed high",
                |obj| {
                    let low = obj.get("low").and_then(Value::as_i64).unwrap_or(0);
                    let high = obj.get("high").and_then(Value::as_i64).unwrap_or(0);
                    low <= high
                },
            ))
            .validated()
            .build()
            .unwrap()
    };

    let on = TypeRegistry::new();
    on.register(descriptor()).unwrap();
    let result = on
        .deserialize("Pair", &json!({"low": 9, "high": 1}))
        .unwrap();
    assert!(result.is_failure());

    let off = TypeRegistry::new().with_features(
        FeatureSet::default().without(EngineFeature::ValidateObjectAfterConstruction),
    );
    off.register(descriptor()).unwrap();
    let result = off
        .deserialize("Pair", &json!({"low": 9, "high": 1}))
        .unwrap();
    assert!(result.is_success());
}
