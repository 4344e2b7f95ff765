//! Usecase validation against the source schema.

use jsonschema::{Draft, Validator};
use serde_json::Value;

use crate::error::{PathSegment, SchemaError, ValidateError};

/// Compile a validator for a usecase schema.
///
/// The `$schema` keyword is dropped first; usecase schemas are always
/// checked as Draft 7.
///
/// # Errors
///
/// Returns `ValidateError::InvalidSchema` if the schema does not compile.
pub fn compile_validator(schema: &Value) -> Result<Validator, ValidateError> {
    let schema = strip_meta_schema(schema);
    jsonschema::options()
        .with_draft(Draft::Draft7)
        .build(&schema)
        .map_err(|e| ValidateError::InvalidSchema {
            message: e.to_string(),
        })
}

/// Validate a usecase document against a schema, returning it when valid.
///
/// # Errors
///
/// Returns `ValidateError::InvalidSchema` if the schema does not compile, or
/// `ValidateError::Invalid` carrying every violation and the document.
pub fn validate<'a>(schema: &Value, document: &'a Value) -> Result<&'a Value, ValidateError> {
    let validator = compile_validator(schema)?;
    validate_with(&validator, document)
}

/// Validate a usecase document with an already-compiled validator.
///
/// Collects all violations rather than stopping at the first, and sorts
/// them by location so repeated runs report them in the same order.
pub fn validate_with<'a>(
    validator: &Validator,
    document: &'a Value,
) -> Result<&'a Value, ValidateError> {
    let mut errors: Vec<SchemaError> = validator
        .iter_errors(document)
        .map(|e| {
            let pointer = e.instance_path.to_string();
            SchemaError {
                path: pointer_segments(document, &pointer),
                pointer,
                message: e.to_string(),
            }
        })
        .collect();

    if errors.is_empty() {
        return Ok(document);
    }

    errors.sort_by(|a, b| a.path.cmp(&b.path).then_with(|| a.message.cmp(&b.message)));
    tracing::debug!(count = errors.len(), "usecase failed validation");
    Err(ValidateError::Invalid {
        errors,
        document: document.clone(),
    })
}

/// Remove a top-level `$schema` keyword, keeping everything else.
pub fn strip_meta_schema(schema: &Value) -> Value {
    match schema {
        Value::Object(map) if map.contains_key("$schema") => Value::Object(
            map.iter()
                .filter(|(k, _)| k.as_str() != "$schema")
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Split a JSON Pointer into typed segments.
///
/// A segment is an index only where the document holds an array at that
/// point, so object keys that look numeric stay keys.
fn pointer_segments(document: &Value, pointer: &str) -> Vec<PathSegment> {
    let path = pointer.trim_start_matches('/');
    if path.is_empty() {
        return Vec::new();
    }

    let mut current = Some(document);
    let mut segments = Vec::new();
    for part in path.split('/') {
        // Unescape JSON Pointer encoding (~1 = /, ~0 = ~)
        let key = part.replace("~1", "/").replace("~0", "~");
        match (current, key.parse::<usize>()) {
            (Some(Value::Array(items)), Ok(index)) => {
                current = items.get(index);
                segments.push(PathSegment::Index(index));
            }
            (node, _) => {
                current = node.and_then(|n| n.get(key.as_str()));
                segments.push(PathSegment::Key(key));
            }
        }
    }
    segments
}
