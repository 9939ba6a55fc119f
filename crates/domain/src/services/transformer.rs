//! Flattens CMS entries into message templates.
//!
//! Rich-text subject and body documents are walked paragraph by paragraph.
//! Text nodes are copied verbatim and inline entry references become
//! `{KEY}` placeholders, with the referenced keys collected as parameters.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::errors::ProcessingError;
use crate::models::{
    CmsEntry, CmsResponse, Document, MessageTemplate, Node, NodeKind, TrafficType,
};

/// Id → entry lookup over a response's linked entries.
struct IncludedEntries<'a> {
    by_id: HashMap<&'a str, &'a CmsEntry>,
}

impl<'a> IncludedEntries<'a> {
    fn from_response(response: &'a CmsResponse) -> Self {
        let mut by_id = HashMap::new();
        for entry in response.included_entries() {
            match entry.id() {
                Some(id) => {
                    by_id.insert(id, entry);
                }
                None => warn!("Included entry has no identifier, skipping"),
            }
        }
        Self { by_id }
    }

    fn get(&self, id: &str) -> Option<&'a CmsEntry> {
        self.by_id.get(id).copied()
    }
}

/// Placeholder keys in first-occurrence order, without duplicates.
#[derive(Debug, Default)]
struct Parameters(Vec<String>);

impl Parameters {
    fn push(&mut self, key: &str) {
        if !self.0.iter().any(|existing| existing == key) {
            self.0.push(key.to_string());
        }
    }

    fn into_inner(self) -> Vec<String> {
        self.0
    }
}

/// Converts CMS responses into [`MessageTemplate`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentTransformer;

impl DocumentTransformer {
    pub fn new() -> Self {
        Self
    }

    /// Returns `Ok(None)` when the response carries no items.
    pub fn transform(
        &self,
        response: &CmsResponse,
    ) -> Result<Option<MessageTemplate>, ProcessingError> {
        let Some(entry) = response.template_entry() else {
            debug!("CMS response has no items");
            return Ok(None);
        };

        let id = entry.id().ok_or(ProcessingError::MissingEntryId)?;
        let includes = IncludedEntries::from_response(response);
        let traffic_type = resolve_traffic_type(entry, &includes);

        let mut parameters = Parameters::default();
        let subject = flatten(entry.fields.subject.as_ref(), &includes, &mut parameters);
        let body = flatten(entry.fields.body.as_ref(), &includes, &mut parameters);

        let template = MessageTemplate {
            id: id.to_string(),
            key: entry.fields.key.clone().unwrap_or_default(),
            name: entry.fields.name.clone().unwrap_or_default(),
            traffic_type,
            subject,
            body,
            parameters: parameters.into_inner(),
        };

        debug!(
            template_id = %template.id,
            parameters = template.parameters.len(),
            "Transformed CMS entry"
        );

        Ok(Some(template))
    }
}

fn resolve_traffic_type(entry: &CmsEntry, includes: &IncludedEntries<'_>) -> Option<TrafficType> {
    let id = entry.fields.traffic_type.as_ref()?.id.as_deref()?;

    match includes.get(id) {
        Some(traffic_type) => Some(TrafficType::new(
            traffic_type.fields.key.clone().unwrap_or_default(),
            traffic_type.fields.name.clone().unwrap_or_default(),
        )),
        None => {
            warn!(traffic_type_id = %id, "Traffic type entry not found in includes");
            None
        }
    }
}

fn flatten(
    document: Option<&Document>,
    includes: &IncludedEntries<'_>,
    parameters: &mut Parameters,
) -> String {
    let Some(nodes) = document.and_then(|document| document.content.as_ref()) else {
        return String::new();
    };

    let mut text = String::new();
    for node in nodes {
        for inline in node.content.iter().flatten() {
            append_inline(inline, includes, parameters, &mut text);
        }
        text.push('\n');
    }

    text.trim().to_string()
}

fn append_inline(
    node: &Node,
    includes: &IncludedEntries<'_>,
    parameters: &mut Parameters,
    text: &mut String,
) {
    match &node.kind {
        NodeKind::Text(value) => text.push_str(value),
        NodeKind::EmbeddedEntryInline(Some(target)) => {
            let Some(key) = includes
                .get(target)
                .and_then(|entry| entry.fields.key.as_deref())
            else {
                // Unresolved or keyless entries leave no placeholder behind.
                debug!(entry_id = %target, "Parameter entry not resolvable, skipping");
                return;
            };
            text.push('{');
            text.push_str(key);
            text.push('}');
            parameters.push(key);
        }
        NodeKind::EmbeddedEntryInline(None) => {
            debug!("Inline entry without target id, skipping");
        }
        NodeKind::Paragraph | NodeKind::Unknown(_) => {}
    }
}
