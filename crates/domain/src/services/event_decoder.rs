//! Resolves object locations from raw change notifications.
//!
//! The typed shape (lowercase `records`) is tried first. When it does not
//! match, the raw JSON tree is searched for the storage service's own
//! `Records[0].s3` shape. Only the first raw record is read.

use serde::Deserialize;
use serde_json::Value;
use shared::object_key::decode_object_key;
use tracing::{debug, warn};

use crate::errors::DecodeError;
use crate::models::{ChangeNotification, ObjectLocation};

/// Decodes `raw` into the object locations it announces, keys URL-decoded.
pub fn resolve_locations(raw: &str) -> Result<Vec<ObjectLocation>, DecodeError> {
    let tree: Value = serde_json::from_str(raw)?;

    let typed = match ChangeNotification::deserialize(&tree) {
        Ok(notification) => notification.records,
        Err(e) => {
            debug!(error = %e, "Notification does not match the typed shape");
            None
        }
    };

    match typed {
        Some(records) => records
            .iter()
            .enumerate()
            .map(|(index, record)| -> Result<ObjectLocation, DecodeError> {
                let container = record.container().ok_or(DecodeError::MissingField {
                    index,
                    field: "s3.bucket.name",
                })?;
                let key = record.raw_key().ok_or(DecodeError::MissingField {
                    index,
                    field: "s3.object.key",
                })?;
                Ok(ObjectLocation::new(container, decode_object_key(key)?))
            })
            .collect(),
        None => fallback_location(&tree).map(|location| location.into_iter().collect()),
    }
}

fn fallback_location(tree: &Value) -> Result<Option<ObjectLocation>, DecodeError> {
    let Some(storage) = tree
        .get("Records")
        .and_then(Value::as_array)
        .and_then(|records| records.first())
        .and_then(|record| record.get("s3"))
    else {
        warn!("Notification carries no storage record, nothing to process");
        return Ok(None);
    };

    let container = storage
        .pointer("/bucket/name")
        .and_then(Value::as_str)
        .ok_or(DecodeError::MissingField {
            index: 0,
            field: "s3.bucket.name",
        })?;
    let key = storage
        .pointer("/object/key")
        .and_then(Value::as_str)
        .ok_or(DecodeError::MissingField {
            index: 0,
            field: "s3.object.key",
        })?;

    debug!(container = %container, key = %key, "Resolved location from raw notification");
    Ok(Some(ObjectLocation::new(container, decode_object_key(key)?)))
}
