//! Sensitive field redaction for audit snapshots.

use serde_json::{Map, Value};

/// Replacement written in place of a sensitive value.
pub const REDACTED: &str = "[REDACTED]";

/// Key fragments that mark a value as sensitive (matched case-insensitively).
pub const SENSITIVE_FIELDS: &[&str] = &[
    "password",
    "token",
    "secret",
    "api_key",
    "private_key",
    "authorization",
    "credential",
    "passport_number",
];

/// Copy of `value` with every sensitive key's value replaced by [`REDACTED`].
///
/// Objects nested inside objects and arrays are redacted too.
#[must_use]
pub fn redact_sensitive_fields(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut redacted = Map::with_capacity(map.len());
            for (key, val) in map {
                let lower = key.to_lowercase();
                if SENSITIVE_FIELDS.iter().any(|field| lower.contains(field)) {
                    redacted.insert(key.clone(), Value::String(REDACTED.to_owned()));
                } else {
                    redacted.insert(key.clone(), redact_sensitive_fields(val));
                }
            }
            Value::Object(redacted)
        }
        Value::Array(items) => Value::Array(items.iter().map(redact_sensitive_fields).collect()),
        other => other.clone(),
    }
}
