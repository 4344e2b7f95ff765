//! Schema-to-template compilation and static overlay.

use serde_json::{Map, Value};

use crate::path::set_path;
use crate::types::{StaticValues, DESCRIPTOR_KEYWORDS};

/// Compile a JSON Schema into a usecase template.
///
/// - `const` wins over everything, including `type`.
/// - Objects with `properties` become a mapping of compiled properties,
///   in declaration order.
/// - Arrays with `items` become a one-element list holding the compiled
///   item template.
/// - Every other node becomes a descriptor: `{"type": ...}` plus any of
///   `properties`, `items`, `required`, `oneOf` and `additionalProperties`
///   found on the node.
///
/// Descriptors are not valid data for their leaf, so a leaf that is never
/// overlaid or resolved fails validation later.
pub fn compile(schema: &Value) -> Value {
    let Some(node) = schema.as_object() else {
        return descriptor(&Map::new());
    };

    if let Some(constant) = node.get("const") {
        return constant.clone();
    }

    match node.get("type").and_then(Value::as_str) {
        Some("object") => {
            if let Some(Value::Object(properties)) = node.get("properties") {
                return Value::Object(
                    properties
                        .iter()
                        .map(|(name, prop)| (name.clone(), compile(prop)))
                        .collect(),
                );
            }
        }
        Some("array") => {
            if let Some(items) = node.get("items") {
                return Value::Array(vec![compile(items)]);
            }
        }
        _ => {}
    }

    descriptor(node)
}

/// Overlay static values onto a template.
///
/// Paths are applied in the overlay's iteration order with
/// [`set_path`], so a later path wins over an earlier overlapping one.
/// The template itself is left untouched.
pub fn apply_static(template: &Value, overlay: &StaticValues) -> Value {
    let mut result = template.clone();
    for (path, value) in overlay {
        set_path(&mut result, path, value.clone());
    }
    result
}

fn descriptor(node: &Map<String, Value>) -> Value {
    let mut result = Map::new();
    result.insert(
        "type".to_string(),
        node.get("type").cloned().unwrap_or(Value::Null),
    );
    for key in DESCRIPTOR_KEYWORDS {
        if let Some(value) = node.get(*key) {
            result.insert(key.to_string(), value.clone());
        }
    }
    Value::Object(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn const_is_returned_verbatim() {
        let schema = json!({"type": "string", "const": "mobility"});
        assert_eq!(compile(&schema), json!("mobility"));

        // const beats a structural type
        let schema = json!({
            "type": "object",
            "const": {"fixed": true},
            "properties": {"fixed": {"type": "boolean"}}
        });
        assert_eq!(compile(&schema), json!({"fixed": true}));
    }

    #[test]
    fn object_properties_recurse() {
        let schema = json!({
            "type": "object",
            "properties": {
                "context": {
                    "type": "object",
                    "properties": {
                        "domain": {"type": "string", "const": "mobility"},
                        "version": {"type": "string"}
                    }
                }
            }
        });
        assert_eq!(
            compile(&schema),
            json!({
                "context": {
                    "domain": "mobility",
                    "version": {"type": "string"}
                }
            })
        );
    }

    #[test]
    fn property_order_is_preserved() {
        let schema = json!({
            "type": "object",
            "properties": {
                "zeta": {"const": 1},
                "alpha": {"const": 2},
                "mid": {"const": 3}
            }
        });
        let template = compile(&schema);
        let keys: Vec<&String> = template.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn array_items_become_single_element_list() {
        let schema = json!({
            "type": "array",
            "items": {"type": "object", "properties": {"id": {"const": "x"}}}
        });
        assert_eq!(compile(&schema), json!([{"id": "x"}]));
    }

    #[test]
    fn leaf_descriptor_keeps_passthrough_keys() {
        let schema = json!({
            "type": "string",
            "oneOf": [{"const": "a"}, {"const": "b"}],
            "required": ["ignored"],
            "description": "dropped"
        });
        assert_eq!(
            compile(&schema),
            json!({
                "type": "string",
                "required": ["ignored"],
                "oneOf": [{"const": "a"}, {"const": "b"}]
            })
        );
    }

    #[test]
    fn object_without_properties_is_a_descriptor() {
        let schema = json!({"type": "object", "additionalProperties": false});
        assert_eq!(
            compile(&schema),
            json!({"type": "object", "additionalProperties": false})
        );
    }

    #[test]
    fn missing_type_yields_null_descriptor() {
        assert_eq!(compile(&json!({})), json!({"type": null}));
        assert_eq!(compile(&json!(true)), json!({"type": null}));
    }

    #[test]
    fn compile_is_deterministic() {
        let schema = json!({
            "type": "object",
            "properties": {
                "a": {"type": "array", "items": {"type": "number"}},
                "b": {"type": "string", "const": "x"}
            }
        });
        assert_eq!(compile(&schema), compile(&schema));
    }

    #[test]
    fn apply_static_sets_paths_on_copy() {
        let template = json!({"context": {"version": {"type": "string"}}});
        let before = template.clone();

        let mut overlay = StaticValues::new();
        overlay.insert("context.version".into(), json!("1.0.0"));
        overlay.insert("message.intent".into(), json!("search"));

        let result = apply_static(&template, &overlay);
        assert_eq!(
            result,
            json!({
                "context": {"version": "1.0.0"},
                "message": {"intent": "search"}
            })
        );
        assert_eq!(template, before);
    }

    #[test]
    fn apply_static_later_path_wins() {
        let mut overlay = StaticValues::new();
        overlay.insert("a.b".into(), json!(1));
        overlay.insert("a".into(), json!("flat"));
        overlay.insert("c".into(), json!(1));
        overlay.insert("c.d".into(), json!(2));

        let result = apply_static(&json!({}), &overlay);
        assert_eq!(result, json!({"a": "flat", "c": {"d": 2}}));
    }
}
