use crate::domain::model::Map;
use crate::utils::naming::KeyCase;
use serde_json::Value;

/// Renames every object key at every depth, arrays included.
pub fn rename_keys(value: Value, case: KeyCase) -> Value {
    match value {
        Value::Object(map) => Value::Object(rename_map_keys(map, case)),
        Value::Array(items) => Value::Array(items.into_iter().map(|v| rename_keys(v, case)).collect()),
        other => other,
    }
}

pub fn rename_map_keys(map: Map, case: KeyCase) -> Map {
    map.into_iter()
        .map(|(key, value)| (case.apply(&key), rename_keys(value, case)))
        .collect()
}

/// Moves the value stored under `old_key` to `new_key`. Returns false when `old_key` is absent.
pub fn replace_key(map: &mut Map, old_key: &str, new_key: &str) -> bool {
    // shift_remove 保留其餘 key 的順序
    match map.shift_remove(old_key) {
        Some(value) => {
            map.insert(new_key.to_string(), value);
            true
        }
        None => false,
    }
}

pub fn replace_keys(map: &mut Map, replacements: &[(&str, &str)]) -> usize {
    replacements
        .iter()
        .filter(|(old_key, new_key)| replace_key(map, old_key, new_key))
        .count()
}

pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
