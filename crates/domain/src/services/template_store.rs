//! Message template persistence contract.

use async_trait::async_trait;

use crate::errors::PersistenceError;
use crate::models::MessageTemplate;

/// Stores and looks up message templates.
///
/// Implementations upsert unconditionally on `save`; the last writer wins.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait TemplateStore: Send + Sync {
    async fn save(&self, template: &MessageTemplate) -> Result<(), PersistenceError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<MessageTemplate>, PersistenceError>;

    /// Returns every template of the traffic type; empty when none match.
    async fn find_by_traffic_type(
        &self,
        traffic_type_key: &str,
    ) -> Result<Vec<MessageTemplate>, PersistenceError>;
}
