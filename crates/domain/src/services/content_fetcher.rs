//! Downloads and parses CMS documents from the object store.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error};

use crate::errors::{DownloadError, ObjectStoreError};
use crate::models::CmsResponse;

/// Read access to stored objects.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Returns the full object body.
    async fn get(&self, container: &str, key: &str) -> Result<Vec<u8>, ObjectStoreError>;
}

/// Fetches a CMS response for a container/key pair.
#[derive(Clone)]
pub struct ContentFetcher {
    store: Arc<dyn ObjectStore>,
}

impl ContentFetcher {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    pub async fn fetch(&self, container: &str, key: &str) -> Result<CmsResponse, DownloadError> {
        debug!(container = %container, key = %key, "Fetching CMS document");

        let bytes = self.store.get(container, key).await.map_err(|source| {
            error!(container = %container, key = %key, error = %source, "Object fetch failed");
            DownloadError::Fetch {
                container: container.to_string(),
                key: key.to_string(),
                source,
            }
        })?;

        serde_json::from_slice(&bytes).map_err(|source| {
            error!(container = %container, key = %key, error = %source, "CMS document is not a valid response");
            DownloadError::Deserialize {
                container: container.to_string(),
                key: key.to_string(),
                source,
            }
        })
    }
}
