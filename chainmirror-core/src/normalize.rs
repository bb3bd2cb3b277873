//! Flattening of tagged-value read-call responses.
//!
//! Upstream responses tag every field with type metadata, e.g.
//! `{"type": "(tuple ...)", "value": {"title": {"type": "(string-ascii 5)", "value": "hello"}}}`.
//! [normalize] removes one envelope and then one wrapper per field. It is
//! deliberately shallow: nested lists of records stay nested and callers
//! normalize them explicitly when they need them flat.

use serde_json::{Map, Value};

const VALUE_FIELD: &str = "value";

/// Unwraps the `{value: ...}` envelope if present and then replaces every
/// field with its inner `value` when it has one. Scalars, arrays and
/// already-flat records pass through unchanged.
pub fn normalize(response: &Value) -> Value {
    let unwrapped = unwrap_one(response);
    match unwrapped {
        Value::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(name, field)| (name.clone(), unwrap_one(field).clone()))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Like [normalize] but always yields a record; non-record input yields an
/// empty one.
pub fn normalize_record(response: &Value) -> Map<String, Value> {
    match normalize(response) {
        Value::Object(fields) => fields,
        _ => Map::new(),
    }
}

fn unwrap_one(value: &Value) -> &Value {
    match value {
        Value::Object(map) => map.get(VALUE_FIELD).unwrap_or(value),
        _ => value,
    }
}
