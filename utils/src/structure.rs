//! Structure-only views of arbitrary documents.
//!
//! Diagnostics about the persisted state must never carry its values (the
//! vault, addresses, balances). [`obj_structure`] keeps the shape of a
//! document and replaces every leaf with the name of its JSON type.

use serde_json::{Map, Value};

/// Map `value` to a document of the same shape whose leaves are type names:
/// `"null"`, `"boolean"`, `"number"` or `"string"`.
///
/// Objects keep their keys; arrays keep their length and order.
pub fn obj_structure(value: &Value) -> Value {
    match value {
        Value::Null => Value::String("null".into()),
        Value::Bool(_) => Value::String("boolean".into()),
        Value::Number(_) => Value::String("number".into()),
        Value::String(_) => Value::String("string".into()),
        Value::Array(items) => Value::Array(items.iter().map(obj_structure).collect()),
        Value::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(k, v)| (k.clone(), obj_structure(v)))
                .collect::<Map<String, Value>>(),
        ),
    }
}
