//! Storage change notification domain model.

use serde::Deserialize;

/// Envelope delivered on the change queue.
///
/// The typed shape uses a lowercase `records` field. Storage services emit
/// `Records`, which leaves `records` empty and sends decoding down the
/// fallback path.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChangeNotification {
    #[serde(default)]
    pub records: Option<Vec<ChangeRecord>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRecord {
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub s3: Option<StorageEntity>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageEntity {
    #[serde(default)]
    pub bucket: Option<BucketEntity>,
    #[serde(default)]
    pub object: Option<ObjectEntity>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BucketEntity {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ObjectEntity {
    #[serde(default)]
    pub key: Option<String>,
}

impl ChangeRecord {
    pub fn container(&self) -> Option<&str> {
        self.s3.as_ref()?.bucket.as_ref()?.name.as_deref()
    }

    pub fn raw_key(&self) -> Option<&str> {
        self.s3.as_ref()?.object.as_ref()?.key.as_deref()
    }
}

/// A resolved object to fetch: container plus decoded key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLocation {
    pub container: String,
    pub key: String,
}

impl ObjectLocation {
    pub fn new(container: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            key: key.into(),
        }
    }
}

impl std::fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.container, self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lowercase_records() {
        let notification: ChangeNotification = serde_json::from_value(json!({
            "records": [{
                "messageId": "m-1",
                "s3": {"bucket": {"name": "cms-bucket"}, "object": {"key": "a+b.json"}}
            }]
        }))
        .unwrap();

        let records = notification.records.unwrap();
        assert_eq!(records[0].message_id.as_deref(), Some("m-1"));
        assert_eq!(records[0].container(), Some("cms-bucket"));
        assert_eq!(records[0].raw_key(), Some("a+b.json"));
    }

    #[test]
    fn test_uppercase_records_leave_typed_field_empty() {
        let notification: ChangeNotification = serde_json::from_value(json!({
            "Records": [{"s3": {"bucket": {"name": "b"}, "object": {"key": "k"}}}]
        }))
        .unwrap();
        assert!(notification.records.is_none());
    }

    #[test]
    fn test_record_without_storage_entity() {
        let record = ChangeRecord::default();
        assert!(record.container().is_none());
        assert!(record.raw_key().is_none());
    }

    #[test]
    fn test_location_display() {
        assert_eq!(ObjectLocation::new("b", "k/x.json").to_string(), "b/k/x.json");
    }
}
