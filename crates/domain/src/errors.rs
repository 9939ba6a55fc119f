//! Domain error types.
//!
//! Each pipeline stage has its own error; `IngestError` wraps them and
//! exposes the failure category used for HTTP status mapping and metrics.

use shared::object_key::ObjectKeyError;
use thiserror::Error;

/// Errors resolving object locations from a change notification.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Notification is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Notification record {index} is missing {field}")]
    MissingField { index: usize, field: &'static str },

    #[error(transparent)]
    ObjectKey(#[from] ObjectKeyError),
}

/// Errors reported by an object store.
#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("Object not found")]
    NotFound,

    #[error("Object store returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Object store request failed: {0}")]
    Transport(String),

    #[error("Object key cannot be addressed over HTTP: {0}")]
    UnaddressableKey(String),
}

/// Errors fetching and parsing a CMS document.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("Failed to fetch {container}/{key}: {source}")]
    Fetch {
        container: String,
        key: String,
        #[source]
        source: ObjectStoreError,
    },

    #[error("Failed to parse CMS response {container}/{key}: {source}")]
    Deserialize {
        container: String,
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors turning a CMS response into a message template.
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("Template entry has no identifier")]
    MissingEntryId,
}

/// Errors reading or writing message templates.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Store operation '{operation}' failed: {message}")]
    Store {
        operation: &'static str,
        message: String,
    },

    #[error("Stored record is malformed: {0}")]
    MalformedRecord(String),
}

impl PersistenceError {
    pub fn store(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Store {
            operation,
            message: message.into(),
        }
    }
}

/// Failure category of a processing attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Download,
    Processing,
    Persistence,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Download => "download",
            FailureKind::Processing => "processing",
            FailureKind::Persistence => "persistence",
        }
    }
}

/// Errors from handling one change notification.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error(transparent)]
    Processing(#[from] ProcessingError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("Failed to acknowledge message: {0}")]
    Acknowledge(String),
}

impl IngestError {
    /// Decode failures count as processing failures: the message itself is bad.
    /// Acknowledgement failures are the queue's fault and count as persistence.
    pub fn kind(&self) -> FailureKind {
        match self {
            IngestError::Decode(_) | IngestError::Processing(_) => FailureKind::Processing,
            IngestError::Download(_) => FailureKind::Download,
            IngestError::Persistence(_) | IngestError::Acknowledge(_) => FailureKind::Persistence,
        }
    }
}
