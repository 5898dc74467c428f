//! Structured-generation wire type for the Draft Generator's single
//! generation call (spec §4.8), plus the `schemars`-derived JSON schema
//! `GenerationPort::generate_structured` validates against.

use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Render `T`'s JSON schema as a `serde_json::Value` for
/// `GenerationPort::generate_structured`.
pub fn schema_value<T: JsonSchema>() -> Value {
    serde_json::to_value(schema_for!(T)).unwrap_or_else(|_| Value::Object(serde_json::Map::new()))
}

/// Output of the Draft Generator's generation call (spec §4.8).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DraftOutput {
    /// Article title.
    pub title: String,
    /// Article body.
    pub body: String,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Owning module label, if any.
    #[serde(default)]
    pub module: Option<String>,
    /// Category label, if any.
    #[serde(default)]
    pub category: Option<String>,
    /// Error codes this article addresses.
    #[serde(default)]
    pub related_error_codes: Vec<String>,
    /// Step-by-step resolution steps, folded into the body text.
    #[serde(default)]
    pub resolution_steps: Vec<String>,
    /// Free-text notes for reviewers, not shown to end users.
    #[serde(default)]
    pub internal_notes: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_schema_round_trips_through_value() {
        let schema = schema_value::<DraftOutput>();
        assert!(schema.is_object());
        let value = serde_json::json!({
            "title": "Rotate client cert",
            "body": "...",
            "tags": ["vpn"],
            "module": "networking",
            "category": "Networking",
            "related_error_codes": ["ERR_CERT_EXPIRED"],
            "resolution_steps": ["run rotate-cert.sh"],
            "internal_notes": "confirmed against three similar cases",
        });
        let parsed: DraftOutput = serde_json::from_value(value).unwrap();
        assert_eq!(parsed.title, "Rotate client cert");
        assert_eq!(parsed.resolution_steps.len(), 1);
    }

    #[test]
    fn draft_schema_tolerates_missing_optional_fields() {
        let value = serde_json::json!({"title": "t", "body": "b"});
        let parsed: DraftOutput = serde_json::from_value(value).unwrap();
        assert!(parsed.tags.is_empty());
        assert!(parsed.module.is_none());
    }
}
