//! Dot-path mutation of nested documents.
//!
//! A dot-path such as `context.location.city` addresses a value through
//! nested objects. Segments are split on every literal `.`; there is no
//! escaping, so keys containing dots cannot be addressed.
//!
//! # Overwrite contract
//!
//! [`set_path`] never fails. Any intermediate segment that is missing, or
//! present but not an object, is replaced by an empty object, discarding
//! whatever was there (a string, a descriptor's array, a list). The final
//! segment is assigned unconditionally. Callers own the meaning of their
//! paths; a typo creates a new branch rather than an error.

use serde_json::{Map, Value};

/// Set `value` at the dot-separated `path` inside `doc`.
///
/// A non-object `doc` is replaced by an empty object first, following the
/// same overwrite rule as intermediate segments.
pub fn set_path(doc: &mut Value, path: &str, value: Value) {
    let mut segments = path.split('.');
    // split always yields at least one item
    let last = segments.next_back().unwrap_or_default();

    let mut current = ensure_object(doc);
    for key in segments {
        let child = current
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        current = ensure_object(child);
    }
    current.insert(last.to_string(), value);
}

/// Look up the value at a dot-separated path, if every segment exists.
pub fn get_path<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(doc, |current, key| current.get(key))
}

fn ensure_object(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("value was just replaced by an object"),
    }
}
