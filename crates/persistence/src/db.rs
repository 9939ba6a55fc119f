//! Store construction from configuration.

use std::sync::Arc;
use std::time::Duration;

use shared::aws::AwsCredentials;
use tracing::info;

use crate::dynamodb::{DynamoDbClient, DynamoDbConfig};
use crate::entities::message_template::{INDEX_PARTITION_KEY, INDEX_SORT_KEY};
use crate::kv_store::{InMemoryKeyValueStore, KeyValueStore, StoreError};

/// Which key-value store backs the repositories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    DynamoDb,
    Memory,
}

/// Database configuration.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub backend: StoreBackend,
    pub traffic_type_index: String,
    pub region: String,
    pub endpoint: Option<String>,
    pub credentials: AwsCredentials,
    pub request_timeout_secs: u64,
}

/// Creates the configured key-value store.
pub fn create_store(config: &DatabaseConfig) -> Result<Arc<dyn KeyValueStore>, StoreError> {
    match config.backend {
        StoreBackend::DynamoDb => {
            info!(region = %config.region, endpoint = ?config.endpoint, "Using DynamoDB store");
            let client = DynamoDbClient::new(DynamoDbConfig {
                region: config.region.clone(),
                endpoint: config.endpoint.clone(),
                credentials: config.credentials.clone(),
                timeout: Duration::from_secs(config.request_timeout_secs),
            })?;
            Ok(Arc::new(client))
        }
        StoreBackend::Memory => {
            info!("Using in-memory store");
            Ok(Arc::new(InMemoryKeyValueStore::new().with_index(
                &config.traffic_type_index,
                INDEX_PARTITION_KEY,
                INDEX_SORT_KEY,
            )))
        }
    }
}
