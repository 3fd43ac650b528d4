//! Tests for thread-safe concurrent access to the type registry.

use inquest::{
    Constraint, Construction, FieldDescriptor, FieldKind, TypeDescriptor, TypeRegistry,
};
use serde_json::json;
use std::sync::Arc;
use std::thread;

fn user_registry() -> TypeRegistry {
    let registry = TypeRegistry::new();
    registry
        .register(
            TypeDescriptor::builder("User")
                .field(
                    FieldDescriptor::new("name", FieldKind::Str).constraint(Constraint::not_null()),
                )
                .field(FieldDescriptor::new("age", FieldKind::Int).constraint(Constraint::min(0)))
                .validated()
                .build()
                .unwrap(),
        )
        .unwrap();
    registry
}

#[test]
fn test_concurrent_deserialization() {
    let registry = Arc::new(user_registry());

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let result = registry
                    .deserialize(
                        "User",
                        &json!({"name": format!("User{}", i), "age": 20 + i}),
                    )
                    .unwrap();
                assert!(result.is_success());
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_concurrent_failures_are_independent() {
    let registry = Arc::new(user_registry());

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let invalid = i % 2 == 0;
                let input = if invalid {
                    json!({"name": null, "age": -1})
                } else {
                    json!({"name": "ok", "age": 1})
                };
                let result = registry.deserialize("User", &input).unwrap();
                if invalid {
                    let violations = result.into_result().unwrap_err();
                    assert_eq!(violations.len(), 2);
                } else {
                    assert!(result.is_success());
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_concurrent_deserializer_access() {
    let registry = Arc::new(user_registry());

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let deserializer = registry.get("User");
                assert!(deserializer.is_some());
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_concurrent_registration_and_use() {
    let registry = Arc::new(user_registry());

    let writers: Vec<_> = (0..4)
        .map(|i| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let _ = registry.register(
                    TypeDescriptor::builder(format!("Point{}", i))
                        .field(FieldDescriptor::new("x", FieldKind::Int).required())
                        .field(FieldDescriptor::new("y", FieldKind::Int).required())
                        .construction(Construction::creator_to_map([
                            "x".to_string(),
                            "y".to_string(),
                        ]))
                        .validated()
                        .build()
                        .unwrap(),
                );
            })
        })
        .collect();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let result = registry
                    .deserialize("User", &json!({"name": "ok", "age": 1}))
                    .unwrap();
                assert!(result.is_success());
            })
        })
        .collect();

    for handle in writers.into_iter().chain(readers) {
        handle.join().unwrap();
    }
}
