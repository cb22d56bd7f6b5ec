//! The schema tree produced by [`transform_node`](crate::transform_node).
//!
//! A node either carries fields ([`ObjectNode`]) or it does not
//! ([`LeafNode`]). Everything else a truth node says about itself is kept as
//! an ordered list of [`Attribute`]s and written out verbatim.

use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Directive key marking a field as not required.
pub const OPTIONAL_KEY: &str = "$optional";

/// Output keys owned by object nodes. Literal attributes with these names are
/// shadowed on serialization.
const STRUCTURAL_KEYS: &[&str] = &["type", "properties", "required"];

/// A key copied from the truth node into the schema node.
#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    /// `$`-prefixed key, kept under its original name.
    Directive(Value),
    /// `_`-prefixed key other than `_items`, kept under the stripped name.
    Literal(Value),
    /// `_items`, transformed like any other node.
    Items(Box<SchemaNode>),
}

/// Ordered attributes of one node, keyed by their output name.
pub type Attributes = IndexMap<String, Attribute>;

#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    Object(ObjectNode),
    Leaf(LeafNode),
}

/// A node with at least one field. Serializes with `type: "object"`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectNode {
    pub attributes: Attributes,
    pub properties: IndexMap<String, SchemaNode>,
    /// `None` until the `required` pass has visited this node.
    pub required: Option<Vec<String>>,
}

/// A node without fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeafNode {
    pub attributes: Attributes,
}

impl SchemaNode {
    pub fn attributes(&self) -> &Attributes {
        match self {
            Self::Object(object) => &object.attributes,
            Self::Leaf(leaf) => &leaf.attributes,
        }
    }

    pub fn attributes_mut(&mut self) -> &mut Attributes {
        match self {
            Self::Object(object) => &mut object.attributes,
            Self::Leaf(leaf) => &mut leaf.attributes,
        }
    }

    pub fn is_optional(&self) -> bool {
        self.attributes().contains_key(OPTIONAL_KEY)
    }

    /// The `type` this node would serialize with.
    ///
    /// Object nodes are always `"object"`; leaves report their literal
    /// `_type`, if it is a string.
    pub fn declared_type(&self) -> Option<&str> {
        match self {
            Self::Object(_) => Some("object"),
            Self::Leaf(leaf) => match leaf.attributes.get("type") {
                Some(Attribute::Literal(Value::String(ty))) => Some(ty.as_str()),
                _ => None,
            },
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::Object(object) => object.to_value(),
            Self::Leaf(leaf) => Value::Object(attributes_to_map(&leaf.attributes, &[])),
        }
    }
}

impl ObjectNode {
    /// Names of literal attributes hidden behind a structural key.
    pub fn shadowed_attributes(&self) -> impl Iterator<Item = &str> {
        let structural = self.structural_keys();
        self.attributes
            .iter()
            .filter(move |(key, attr)| {
                matches!(attr, Attribute::Literal(_) | Attribute::Items(_))
                    && structural.contains(&key.as_str())
            })
            .map(|(key, _)| key.as_str())
    }

    fn structural_keys(&self) -> &'static [&'static str] {
        if self.required.is_some() {
            STRUCTURAL_KEYS
        } else {
            &STRUCTURAL_KEYS[..2]
        }
    }

    pub fn to_value(&self) -> Value {
        let mut map = attributes_to_map(&self.attributes, self.structural_keys());
        map.insert("type".to_string(), Value::String("object".to_string()));
        let properties: Map<String, Value> = self
            .properties
            .iter()
            .map(|(name, node)| (name.clone(), node.to_value()))
            .collect();
        map.insert("properties".to_string(), Value::Object(properties));
        if let Some(required) = &self.required {
            map.insert(
                "required".to_string(),
                Value::Array(required.iter().cloned().map(Value::String).collect()),
            );
        }
        Value::Object(map)
    }
}

fn attributes_to_map(attributes: &Attributes, shadowed: &[&str]) -> Map<String, Value> {
    attributes
        .iter()
        .filter(|(key, attr)| {
            matches!(attr, Attribute::Directive(_)) || !shadowed.contains(&key.as_str())
        })
        .map(|(key, attr)| {
            let value = match attr {
                Attribute::Directive(value) | Attribute::Literal(value) => value.clone(),
                Attribute::Items(node) => node.to_value(),
            };
            (key.clone(), value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn literal(value: Value) -> Attribute {
        Attribute::Literal(value)
    }

    #[test]
    fn leaf_serializes_attributes_in_order() {
        let mut leaf = LeafNode::default();
        leaf.attributes.insert("type".into(), literal(json!("string")));
        leaf.attributes
            .insert("$comment".into(), Attribute::Directive(json!("tag")));
        let value = SchemaNode::Leaf(leaf).to_value();

        let keys: Vec<&String> = value
            .as_object()
            .expect("test value is an object")
            .keys()
            .collect();
        assert_eq!(keys, &["type", "$comment"]);
    }

    #[test]
    fn object_emits_structural_keys_after_attributes() {
        let mut object = ObjectNode::default();
        object
            .attributes
            .insert("description".into(), literal(json!("root")));
        object
            .properties
            .insert("name".into(), SchemaNode::Leaf(LeafNode::default()));
        object.required = Some(vec!["name".into()]);

        assert_eq!(
            SchemaNode::Object(object).to_value(),
            json!({
                "description": "root",
                "type": "object",
                "properties": {"name": {}},
                "required": ["name"]
            })
        );
    }

    #[test]
    fn literal_type_is_shadowed_on_objects() {
        let mut object = ObjectNode::default();
        object.attributes.insert("type".into(), literal(json!("array")));
        object
            .properties
            .insert("a".into(), SchemaNode::Leaf(LeafNode::default()));

        assert_eq!(object.shadowed_attributes().collect::<Vec<_>>(), ["type"]);
        assert_eq!(object.to_value()["type"], "object");
    }

    #[test]
    fn literal_required_survives_until_derived() {
        let mut object = ObjectNode::default();
        object
            .attributes
            .insert("required".into(), literal(json!(["x"])));
        object
            .properties
            .insert("a".into(), SchemaNode::Leaf(LeafNode::default()));
        assert_eq!(object.to_value()["required"], json!(["x"]));

        object.required = Some(Vec::new());
        assert_eq!(object.to_value()["required"], json!([]));
    }

    #[test]
    fn declared_type_of_leaf_reads_literal() {
        let mut leaf = LeafNode::default();
        assert_eq!(SchemaNode::Leaf(leaf.clone()).declared_type(), None);
        leaf.attributes.insert("type".into(), literal(json!("array")));
        assert_eq!(SchemaNode::Leaf(leaf).declared_type(), Some("array"));
    }

    #[test]
    fn optional_marker_is_presence_only() {
        let mut leaf = LeafNode::default();
        leaf.attributes
            .insert(OPTIONAL_KEY.into(), Attribute::Directive(json!(false)));
        assert!(SchemaNode::Leaf(leaf).is_optional());
    }
}
