//! Document content boundary and canonical serialization.
//!
//! Templates arrive as arbitrary JSON-LD mappings. The engine never inspects
//! their shape; it only requires that the top level is an object and that the
//! content can be turned into a deterministic text form for keyword indexing
//! and embedding. Canonicalization sorts object keys recursively so the same
//! mapping always produces the same string regardless of insertion order.

use serde_json::{Map, Value};

use crate::error::{Result, TemplarError};

/// Ensure `content` is a structured mapping, returning its fields.
///
/// Scalars and bare sequences are rejected with
/// [`TemplarError::InvalidDocument`].
pub fn require_object(content: &Value) -> Result<&Map<String, Value>> {
    content.as_object().ok_or_else(|| {
        TemplarError::invalid_document(format!(
            "content must be a JSON object, got {}",
            value_kind(content)
        ))
    })
}

/// Produce the canonical textual form of `content`.
///
/// Object keys are sorted recursively; arrays keep their order. The result is
/// the indexable text form used for both the keyword index and embedding.
pub fn canonical_json(content: &Value) -> String {
    canonicalize(content).to_string()
}

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = Map::new();
            for key in keys {
                sorted.insert(key.clone(), canonicalize(&map[key]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
