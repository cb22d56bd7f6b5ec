//! Derivation of `required` lists from `$optional` markers.
//!
//! Every field of an object node is required unless its own node carries an
//! `$optional` directive. The marker is dropped once it has been accounted
//! for, so it never reaches the written schema.

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::node::{Attribute, ObjectNode, OPTIONAL_KEY, SchemaNode};

/// Derive `required` for `node` itself.
///
/// Fields that are objects are not descended into: their own `required`
/// lists stay unset and any `$optional` markers below the first level are
/// kept. Use [`post_transform_recursive`] to process the whole tree.
///
/// # Errors
///
/// [`Error::MissingType`] if `node` is not an object, and
/// [`Error::MissingProperties`] if it declares `type: object` without any
/// fields.
pub fn post_transform(node: SchemaNode) -> Result<SchemaNode> {
    let mut object = expect_object(node)?;
    derive_required(&mut object);
    let nested = object
        .properties
        .values()
        .filter(|field| matches!(field, SchemaNode::Object(_)))
        .count();
    if nested > 0 {
        debug!(nested, "nested objects left without `required`");
    }
    Ok(SchemaNode::Object(object))
}

/// Derive `required` for `node` and for every object node below it,
/// reachable through `properties` or `items`, innermost first.
///
/// Leaves met on the way are left alone; only `node` itself must be an
/// object.
///
/// # Errors
///
/// Same as [`post_transform`], for `node` only.
pub fn post_transform_recursive(node: SchemaNode) -> Result<SchemaNode> {
    let mut object = expect_object(node)?;
    derive_required_deep(&mut object);
    Ok(SchemaNode::Object(object))
}

fn expect_object(node: SchemaNode) -> Result<ObjectNode> {
    match node {
        SchemaNode::Object(object) => Ok(object),
        leaf @ SchemaNode::Leaf(_) => match leaf.declared_type() {
            Some("object") => Err(Error::MissingProperties),
            found => Err(Error::MissingType {
                found: found.map(str::to_string),
            }),
        },
    }
}

fn derive_required_deep(object: &mut ObjectNode) {
    for attr in object.attributes.values_mut() {
        if let Attribute::Items(items) = attr {
            descend(items);
        }
    }
    for field in object.properties.values_mut() {
        descend(field);
    }
    derive_required(object);
}

fn descend(node: &mut SchemaNode) {
    match node {
        SchemaNode::Object(object) => derive_required_deep(object),
        SchemaNode::Leaf(leaf) => {
            for attr in leaf.attributes.values_mut() {
                if let Attribute::Items(items) = attr {
                    descend(items);
                }
            }
        }
    }
}

fn derive_required(object: &mut ObjectNode) {
    let mut required = Vec::with_capacity(object.properties.len());
    for (name, field) in &mut object.properties {
        if field.is_optional() {
            field.attributes_mut().shift_remove(OPTIONAL_KEY);
        } else {
            required.push(name.clone());
        }
    }
    if object.attributes.contains_key("required") {
        warn!("literal `required` is overridden by the derived list");
    }
    object.required = Some(required);
}
