//! Wire format: records, request assembly, and JSON helpers shared with the interpreter.

mod builder;
pub mod record;
pub use builder::*;
pub use record::*;

use serde_json::Value;

/// Nodes that may hold a single object or an array of them.
pub(crate) fn many(v: &Value) -> Vec<&Value> {
    match v {
        Value::Array(items) => items.iter().collect(),
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

/// Scalar as text; strings verbatim, numbers and booleans rendered.
pub(crate) fn text_of(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
