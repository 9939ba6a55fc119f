//! Rich-text document domain model.
//!
//! The CMS ships subject and body fields as a tree of typed nodes. Node kinds
//! are resolved once during deserialization so the document walk can match on
//! a closed set instead of comparing type strings.

use serde::Deserialize;

pub const PARAGRAPH: &str = "paragraph";
pub const TEXT: &str = "text";
pub const EMBEDDED_ENTRY_INLINE: &str = "embedded-entry-inline";

/// Root of a rich-text field.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default)]
    pub node_type: Option<String>,
    #[serde(default)]
    pub content: Option<Vec<Node>>,
}

impl Document {
    /// Creates a document with the given top-level nodes.
    pub fn new(content: Vec<Node>) -> Self {
        Self {
            node_type: Some("document".to_string()),
            content: Some(content),
        }
    }
}

/// A node of the document tree.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawNode")]
pub struct Node {
    pub kind: NodeKind,
    pub content: Option<Vec<Node>>,
}

/// The node kinds the document walk understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Paragraph,
    /// Literal text, carried verbatim.
    Text(String),
    /// Inline reference to another entry. `None` when the node's
    /// `data.target.sys.id` is missing or not a string.
    EmbeddedEntryInline(Option<String>),
    /// Any node type not modeled yet.
    Unknown(String),
}

impl Node {
    pub fn paragraph(content: Vec<Node>) -> Self {
        Self {
            kind: NodeKind::Paragraph,
            content: Some(content),
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::Text(value.into()),
            content: None,
        }
    }

    pub fn embedded_entry(target_id: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::EmbeddedEntryInline(Some(target_id.into())),
            content: None,
        }
    }

    pub fn unknown(node_type: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::Unknown(node_type.into()),
            content: None,
        }
    }

    /// Node type name as it appears on the wire.
    pub fn node_type(&self) -> &str {
        match &self.kind {
            NodeKind::Paragraph => PARAGRAPH,
            NodeKind::Text(_) => TEXT,
            NodeKind::EmbeddedEntryInline(_) => EMBEDDED_ENTRY_INLINE,
            NodeKind::Unknown(node_type) => node_type,
        }
    }
}

/// Wire representation of a node before its kind is resolved.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNode {
    #[serde(default)]
    node_type: String,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    content: Option<Vec<Node>>,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

impl From<RawNode> for Node {
    fn from(raw: RawNode) -> Self {
        let kind = match raw.node_type.as_str() {
            PARAGRAPH => NodeKind::Paragraph,
            TEXT => NodeKind::Text(raw.value.unwrap_or_default()),
            EMBEDDED_ENTRY_INLINE => NodeKind::EmbeddedEntryInline(
                raw.data
                    .as_ref()
                    .and_then(|data| data.pointer("/target/sys/id"))
                    .and_then(serde_json::Value::as_str)
                    .map(str::to_string),
            ),
            _ => NodeKind::Unknown(raw.node_type),
        };

        Self {
            kind,
            content: raw.content,
        }
    }
}
