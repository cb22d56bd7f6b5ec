use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{Error, Result};
use crate::node::{Attribute, LeafNode, ObjectNode, SchemaNode};

/// Escaped key whose value is transformed instead of copied.
const ITEMS_KEY: &str = "items";

/// Convert one truth node into a schema node.
///
/// - `$key` is kept verbatim as a directive.
/// - `_key` is kept verbatim under `key`, except `_items`, which is
///   transformed recursively.
/// - Any other key is a field: the node becomes an object and the value is
///   transformed into `properties[key]`.
///
/// Field order is preserved.
///
/// # Errors
///
/// Returns [`Error::InputShape`] if a field or `_items` value is not a
/// mapping.
pub fn transform_node(input: &Map<String, Value>) -> Result<SchemaNode> {
    transform_at(input, "")
}

fn transform_at(input: &Map<String, Value>, path: &str) -> Result<SchemaNode> {
    let mut attributes = crate::node::Attributes::new();
    let mut properties = None;

    for (key, value) in input {
        if key.starts_with('$') {
            attributes.insert(key.clone(), Attribute::Directive(value.clone()));
        } else if let Some(name) = key.strip_prefix('_') {
            let attr = if name == ITEMS_KEY {
                let child_path = format!("{path}/{ITEMS_KEY}");
                Attribute::Items(Box::new(transform_value(value, &child_path)?))
            } else {
                Attribute::Literal(value.clone())
            };
            attributes.insert(name.to_string(), attr);
        } else {
            let child_path = format!("{path}/properties/{}", escape_pointer(key));
            let node = transform_value(value, &child_path)?;
            properties
                .get_or_insert_with(indexmap::IndexMap::new)
                .insert(key.clone(), node);
        }
    }

    let Some(properties) = properties else {
        return Ok(SchemaNode::Leaf(LeafNode { attributes }));
    };
    let object = ObjectNode {
        attributes,
        properties,
        required: None,
    };
    for key in object.shadowed_attributes() {
        warn!(path, key, "literal key is overridden by the derived object schema");
    }
    Ok(SchemaNode::Object(object))
}

fn transform_value(value: &Value, path: &str) -> Result<SchemaNode> {
    match value {
        Value::Object(map) => transform_at(map, path),
        other => Err(Error::shape(
            path,
            format!("expected a mapping, found {}", kind(other)),
        )),
    }
}

pub(crate) fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

/// Escape a key for use as a JSON pointer segment (RFC 6901).
fn escape_pointer(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}
