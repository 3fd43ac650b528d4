//! Shape coercion of raw input values against declared field kinds.

use serde_json::Value;

use crate::schema::FieldKind;

/// A shape mismatch between raw input and a declared kind.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BindError {
    /// Null input for a primitive (non-nullable) kind.
    #[error("null is not a valid value for a primitive field")]
    NullForPrimitive,

    /// The input's shape does not match the declared kind. Carries the
    /// literal textual form of the offending input.
    #[error("input '{text}' does not match the expected shape")]
    Mismatch { text: String },
}

impl BindError {
    /// The literal textual form of the offending input.
    pub fn text(&self) -> String {
        match self {
            BindError::NullForPrimitive => "null".to_string(),
            BindError::Mismatch { text } => text.clone(),
        }
    }
}

/// Deserializes raw input into a typed value for one declared kind.
///
/// A collaborator seam: the engine performs no coercion of its own. A
/// custom binder is also the extension point for implicit non-nullability
/// conventions: it may reject `Null` for any kind it considers
/// non-nullable, beyond the primitive kinds `JsonBinder` rejects.
pub trait Binder: Send + Sync {
    /// Binds a raw value against a kind, or reports the shape mismatch.
    fn bind(&self, kind: &FieldKind, raw: &Value) -> Result<Value, BindError>;
}

/// The default binder: structural JSON shape checks, no value conversion.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonBinder;

fn literal_text(raw: &Value) -> String {
    match raw {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// The JSON shape name of a value, for error messages.
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl Binder for JsonBinder {
    fn bind(&self, kind: &FieldKind, raw: &Value) -> Result<Value, BindError> {
        if raw.is_null() {
            return if kind.is_primitive() {
                Err(BindError::NullForPrimitive)
            } else {
                Ok(Value::Null)
            };
        }

        let matches = match kind {
            FieldKind::Bool => raw.is_boolean(),
            FieldKind::Int => raw.as_i64().is_some() || raw.as_u64().is_some(),
            FieldKind::Float => raw.is_number(),
            FieldKind::Str => raw.is_string(),
            FieldKind::Object(_) => raw.is_object(),
            FieldKind::Array(_) => raw.is_array(),
            FieldKind::Map(_) => raw.is_object(),
            FieldKind::Any => true,
        };

        if matches {
            Ok(raw.clone())
        } else {
            Err(BindError::Mismatch {
                text: literal_text(raw),
            })
        }
    }
}
