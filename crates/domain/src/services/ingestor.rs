//! Change notification ingestion.
//!
//! One notification is handled end to end: locations are resolved, each
//! object is fetched, transformed and stored, and only when every location
//! succeeded is the notification acknowledged. Any failure leaves it
//! unacknowledged so the queue redelivers it.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::errors::IngestError;
use crate::models::ObjectLocation;
use crate::services::content_fetcher::{ContentFetcher, ObjectStore};
use crate::services::event_decoder::resolve_locations;
use crate::services::template_store::TemplateStore;
use crate::services::transformer::DocumentTransformer;

/// Signals successful consumption of a notification back to its source.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait Acknowledgement: Send + Sync {
    async fn acknowledge(&self) -> Result<(), String>;
}

/// Outcome of a successfully processed notification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    /// Number of object locations the notification resolved to.
    pub locations: usize,
    /// Ids of the templates written, in location order.
    pub saved: Vec<String>,
    /// Locations whose document produced no template.
    pub skipped: usize,
}

/// Drives fetch → transform → store for change notifications.
#[derive(Clone)]
pub struct EventIngestor {
    fetcher: ContentFetcher,
    transformer: DocumentTransformer,
    store: Arc<dyn TemplateStore>,
}

impl EventIngestor {
    pub fn new(objects: Arc<dyn ObjectStore>, store: Arc<dyn TemplateStore>) -> Self {
        Self {
            fetcher: ContentFetcher::new(objects),
            transformer: DocumentTransformer::new(),
            store,
        }
    }

    /// Processes a notification without acknowledging it.
    pub async fn process(&self, raw: &str) -> Result<IngestReport, IngestError> {
        let locations = resolve_locations(raw)?;
        let mut report = IngestReport {
            locations: locations.len(),
            ..IngestReport::default()
        };

        for location in &locations {
            match self.process_location(location).await? {
                Some(template_id) => report.saved.push(template_id),
                None => report.skipped += 1,
            }
        }

        Ok(report)
    }

    /// Processes a notification and acknowledges it exactly once on success.
    pub async fn handle(
        &self,
        raw: &str,
        ack: &dyn Acknowledgement,
    ) -> Result<IngestReport, IngestError> {
        let report = self.process(raw).await.map_err(|e| {
            error!(error = %e, kind = e.kind().as_str(), "Failed to process notification");
            e
        })?;

        ack.acknowledge().await.map_err(|e| {
            error!(error = %e, "Failed to acknowledge notification");
            IngestError::Acknowledge(e)
        })?;

        info!(
            locations = report.locations,
            saved = report.saved.len(),
            "Notification processed and acknowledged"
        );
        Ok(report)
    }

    async fn process_location(
        &self,
        location: &ObjectLocation,
    ) -> Result<Option<String>, IngestError> {
        info!(container = %location.container, key = %location.key, "Processing object");

        let response = self.fetcher.fetch(&location.container, &location.key).await?;

        let Some(template) = self.transformer.transform(&response)? else {
            warn!(container = %location.container, key = %location.key, "Document produced no template, skipping");
            return Ok(None);
        };

        self.store.save(&template).await?;
        info!(template_id = %template.id, key = %template.key, "Saved message template");

        Ok(Some(template.id))
    }
}
