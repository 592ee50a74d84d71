//! Best-effort request schema inference from example bodies.
//!
//! Only the top level of a decoded JSON object is described; nested values
//! contribute just their JSON type. Inference never fails: a body that does
//! not decode is described as a plain string.

use serde_json::{json, Map, Value};

/// JSON-schema type name for a decoded value.
///
/// `null` has no useful schema type here and maps to `"string"`.
pub fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
        Value::Null => "string",
    }
}

/// Infer an object schema from a raw example body.
pub fn infer_from_example(raw: &str) -> Value {
    let Ok(decoded) = serde_json::from_str::<Value>(raw) else {
        return json!({ "type": "string" });
    };

    let mut properties = Map::new();
    if let Value::Object(fields) = &decoded {
        for (key, value) in fields {
            properties.insert(key.clone(), json!({ "type": json_type(value) }));
        }
    }

    json!({
        "type": "object",
        "properties": properties,
    })
}
