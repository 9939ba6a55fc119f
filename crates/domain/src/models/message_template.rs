//! Message template domain model.

use serde::{Deserialize, Serialize};

/// A flattened, storable notification template.
///
/// `subject` and `body` contain `{PARAM_KEY}` placeholders; `parameters`
/// lists each placeholder key once, in first-occurrence order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageTemplate {
    pub id: String,
    pub key: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traffic_type: Option<TrafficType>,
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub parameters: Vec<String>,
}

/// Category a template belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficType {
    pub key: String,
    pub name: String,
}

impl TrafficType {
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
        }
    }
}
