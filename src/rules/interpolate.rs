//! Message interpolation for rule templates.

use serde_json::Value;

/// Turns a rule's message template into the final human-readable message.
///
/// This is a collaborator seam: the engine never interprets templates
/// itself, so a richer interpolator (locale bundles, expression languages)
/// can be plugged in without touching the engine.
pub trait MessageInterpolator: Send + Sync {
    /// Interpolates `template` for the given invalid value.
    fn interpolate(&self, template: &str, invalid_value: Option<&Value>) -> String;
}

/// Default interpolator: substitutes the literal `{value}` placeholder with
/// the rendered invalid value and returns the template otherwise unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultInterpolator;

impl DefaultInterpolator {
    fn render(value: Option<&Value>) -> String {
        match value {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => "null".to_string(),
        }
    }
}

impl MessageInterpolator for DefaultInterpolator {
    fn interpolate(&self, template: &str, invalid_value: Option<&Value>) -> String {
        if template.contains("{value}") {
            template.replace("{value}", &Self::render(invalid_value))
        } else {
            template.to_string()
        }
    }
}
