//! CMS delivery response domain model.

use serde::Deserialize;

use super::document::Document;

/// A CMS query response: the entries matched plus linked entries they reference.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CmsResponse {
    #[serde(default)]
    pub sys: Option<Sys>,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub skip: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub items: Option<Vec<CmsEntry>>,
    #[serde(default)]
    pub errors: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub includes: Option<Includes>,
}

impl CmsResponse {
    /// The entry the response describes; only the first item counts.
    pub fn template_entry(&self) -> Option<&CmsEntry> {
        self.items.as_ref().and_then(|items| items.first())
    }

    /// Linked entries shipped alongside the items.
    pub fn included_entries(&self) -> &[CmsEntry] {
        self.includes
            .as_ref()
            .and_then(|includes| includes.entry.as_deref())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Includes {
    #[serde(rename = "Entry", default)]
    pub entry: Option<Vec<CmsEntry>>,
}

/// System metadata carried by every CMS object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sys {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, rename = "type")]
    pub sys_type: Option<String>,
    #[serde(default)]
    pub link_type: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub revision: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CmsEntry {
    #[serde(default)]
    pub sys: Sys,
    #[serde(default)]
    pub fields: EntryFields,
}

impl CmsEntry {
    pub fn id(&self) -> Option<&str> {
        self.sys.id.as_deref()
    }
}

/// Entry fields. Template entries use all of them; parameter and traffic
/// type entries only carry `key` and `name`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryFields {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub traffic_type: Option<EntryReference>,
    #[serde(default)]
    pub subject: Option<Document>,
    #[serde(default)]
    pub body: Option<Document>,
}

/// A link to another entry.
///
/// Accepted as either `{"id": ...}` or the CMS link form `{"sys": {"id": ...}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "RawReference")]
pub struct EntryReference {
    pub id: Option<String>,
}

#[derive(Deserialize)]
struct RawReference {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    sys: Option<Sys>,
}

impl From<RawReference> for EntryReference {
    fn from(raw: RawReference) -> Self {
        Self {
            id: raw.id.or_else(|| raw.sys.and_then(|sys| sys.id)),
        }
    }
}
