//! Wide-row item representation.
//!
//! Attribute values use the DynamoDB JSON wire encoding so items serialize
//! directly into request and response bodies.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A single attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeValue {
    #[serde(rename = "S")]
    S(String),
    #[serde(rename = "SS")]
    Ss(Vec<String>),
    #[serde(rename = "N")]
    N(String),
    #[serde(rename = "BOOL")]
    Bool(bool),
    #[serde(rename = "NULL")]
    Null(bool),
    #[serde(rename = "L")]
    L(Vec<AttributeValue>),
    #[serde(rename = "M")]
    M(HashMap<String, AttributeValue>),
}

impl AttributeValue {
    pub fn as_s(&self) -> Option<&str> {
        match self {
            AttributeValue::S(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_ss(&self) -> Option<&[String]> {
        match self {
            AttributeValue::Ss(values) => Some(values),
            _ => None,
        }
    }
}

/// Attribute name → value.
pub type Item = HashMap<String, AttributeValue>;

/// Reads a string attribute.
pub fn string_attribute<'a>(item: &'a Item, name: &str) -> Option<&'a str> {
    item.get(name).and_then(AttributeValue::as_s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_encoding() {
        let mut item = Item::new();
        item.insert("PK".to_string(), AttributeValue::S("TEMPLATE#1".to_string()));
        item.insert(
            "parameters".to_string(),
            AttributeValue::Ss(vec!["A".to_string(), "B".to_string()]),
        );

        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["PK"], json!({"S": "TEMPLATE#1"}));
        assert_eq!(value["parameters"], json!({"SS": ["A", "B"]}));
    }

    #[test]
    fn test_decode_response_item() {
        let item: Item = serde_json::from_value(json!({
            "id": {"S": "1"},
            "count": {"N": "3"},
            "active": {"BOOL": true},
            "nested": {"M": {"a": {"NULL": true}}},
            "list": {"L": [{"S": "x"}]}
        }))
        .unwrap();

        assert_eq!(string_attribute(&item, "id"), Some("1"));
        assert_eq!(item["count"], AttributeValue::N("3".to_string()));
        assert_eq!(string_attribute(&item, "count"), None);
        assert!(item["list"].as_ss().is_none());
    }
}
