//! Null sweeping
//!
//! Removes placeholder values from a JSON record before it is stored. Only the
//! fixed sentinels below count as empty: `""`, `"null"`, `"N/A"`, JSON
//! `null`, `[]` and `{}`. Numbers and booleans are always kept, including
//! `0`, `0.0` and `false`.

use serde_json::{Map, Value};

/// Strings treated as missing values
pub const NULL_STRINGS: [&str; 3] = ["", "null", "N/A"];

/// Whether `value` is one of the empty sentinels.
pub fn is_null_sentinel(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => NULL_STRINGS.contains(&s.as_str()),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Recursively drop sentinel entries from maps and sentinel items from
/// arrays. Containers left empty by the sweep are dropped as well.
///
/// Sweeping a swept value returns it unchanged.
pub fn sweep(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(sweep_map(map)),
        Value::Array(items) => Value::Array(sweep_items(items)),
        other => other,
    }
}

fn sweep_map(map: Map<String, Value>) -> Map<String, Value> {
    map.into_iter()
        .map(|(key, value)| (key, sweep(value)))
        .filter(|(_, value)| !is_null_sentinel(value))
        .collect()
}

fn sweep_items(items: Vec<Value>) -> Vec<Value> {
    items
        .into_iter()
        .map(sweep)
        .filter(|value| !is_null_sentinel(value))
        .collect()
}
