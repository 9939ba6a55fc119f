//! Repository for message template store operations.

use std::sync::Arc;

use async_trait::async_trait;
use domain::errors::PersistenceError;
use domain::models::MessageTemplate;
use domain::services::TemplateStore;
use tracing::{debug, error};

use crate::entities::message_template::{
    template_partition, traffic_type_partition, MessageTemplateEntity, INDEX_PARTITION_KEY,
};
use crate::item::Item;
use crate::kv_store::{KeyQuery, KeyValueStore, StoreError};
use crate::metrics::QueryTimer;

/// Repository for message template operations.
#[derive(Clone)]
pub struct MessageTemplateRepository {
    store: Arc<dyn KeyValueStore>,
    table_name: String,
    traffic_type_index: String,
}

impl MessageTemplateRepository {
    /// Creates a new message template repository.
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        table_name: impl Into<String>,
        traffic_type_index: impl Into<String>,
    ) -> Self {
        Self {
            store,
            table_name: table_name.into(),
            traffic_type_index: traffic_type_index.into(),
        }
    }

    /// Checks that the underlying store is reachable.
    pub async fn health_check(&self) -> Result<(), PersistenceError> {
        self.store
            .ping()
            .await
            .map_err(|e| store_failure("ping", e))
    }

    async fn query(
        &self,
        operation: &'static str,
        query: KeyQuery,
    ) -> Result<Vec<MessageTemplate>, PersistenceError> {
        let timer = QueryTimer::new(operation);
        let result = self.store.query(&query).await;
        timer.record();

        let items = result.map_err(|e| store_failure(operation, e))?;
        items.iter().map(to_template).collect()
    }
}

#[async_trait]
impl TemplateStore for MessageTemplateRepository {
    async fn save(&self, template: &MessageTemplate) -> Result<(), PersistenceError> {
        let item = MessageTemplateEntity::from(template).into_item();

        let timer = QueryTimer::new("save_template");
        let result = self.store.put_item(&self.table_name, item).await;
        timer.record();

        result.map_err(|e| store_failure("save_template", e))?;
        debug!(template_id = %template.id, table = %self.table_name, "Stored message template");
        Ok(())
    }

    /// Returns the first row under the template's partition.
    async fn find_by_id(&self, id: &str) -> Result<Option<MessageTemplate>, PersistenceError> {
        let templates = self
            .query(
                "find_template_by_id",
                KeyQuery::table(&self.table_name, template_partition(id)),
            )
            .await?;

        Ok(templates.into_iter().next())
    }

    async fn find_by_traffic_type(
        &self,
        traffic_type_key: &str,
    ) -> Result<Vec<MessageTemplate>, PersistenceError> {
        self.query(
            "find_templates_by_traffic_type",
            KeyQuery::index(
                &self.table_name,
                &self.traffic_type_index,
                INDEX_PARTITION_KEY,
                traffic_type_partition(traffic_type_key),
            ),
        )
        .await
    }
}

fn to_template(item: &Item) -> Result<MessageTemplate, PersistenceError> {
    MessageTemplateEntity::try_from_item(item)
        .map(MessageTemplate::from)
        .map_err(|attribute| {
            PersistenceError::MalformedRecord(format!("missing attribute '{}'", attribute))
        })
}

fn store_failure(operation: &'static str, e: StoreError) -> PersistenceError {
    error!(operation = %operation, error = %e, "Store operation failed");
    PersistenceError::store(operation, e.to_string())
}
