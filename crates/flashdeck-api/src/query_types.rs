//! Query-string shaping.
//!
//! Query strings arrive as flat `(key, value)` pairs. Finds validate a JSON
//! object, so pairs are grouped first: a key seen once maps to a string, a
//! repeated key (or one written as `key[]`) maps to an array.

use serde_json::{Map, Value};

/// Group raw query pairs into a JSON object, preserving value order.
pub fn group_pairs(pairs: Vec<(String, String)>) -> Map<String, Value> {
    let mut map = Map::new();
    for (raw_key, value) in pairs {
        let (key, forced_list) = match raw_key.strip_suffix("[]") {
            Some(stripped) => (stripped.to_string(), true),
            None => (raw_key, false),
        };

        match map.get_mut(&key) {
            Some(Value::Array(items)) => items.push(Value::String(value)),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, Value::String(value)]);
            }
            None if forced_list => {
                map.insert(key, Value::Array(vec![Value::String(value)]));
            }
            None => {
                map.insert(key, Value::String(value));
            }
        }
    }
    map
}
