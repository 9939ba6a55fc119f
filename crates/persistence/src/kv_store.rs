//! Key-value store abstraction and the in-memory implementation.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use shared::aws::SigningError;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::item::{string_attribute, Item};

/// Table partition key attribute.
pub const PARTITION_KEY: &str = "PK";
/// Table sort key attribute.
pub const SORT_KEY: &str = "SK";

/// Errors from the key-value store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store request failed: {0}")]
    Transport(String),

    #[error("Store returned status {status} ({error_type}): {message}")]
    Service {
        status: u16,
        error_type: String,
        message: String,
    },

    #[error("Invalid store response: {0}")]
    InvalidResponse(String),

    #[error("Item is missing key attribute '{0}'")]
    MissingKey(&'static str),

    #[error("Unknown index: {0}")]
    UnknownIndex(String),

    #[error("Failed to sign store request: {0}")]
    Signing(#[from] SigningError),
}

/// Equality condition on a partition attribute, against a table or one of its indexes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyQuery {
    pub table: String,
    pub index: Option<String>,
    pub partition_attribute: String,
    pub partition_value: String,
}

impl KeyQuery {
    pub fn table(table: impl Into<String>, partition_value: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            index: None,
            partition_attribute: PARTITION_KEY.to_string(),
            partition_value: partition_value.into(),
        }
    }

    pub fn index(
        table: impl Into<String>,
        index: impl Into<String>,
        partition_attribute: impl Into<String>,
        partition_value: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            index: Some(index.into()),
            partition_attribute: partition_attribute.into(),
            partition_value: partition_value.into(),
        }
    }
}

/// Wide-row store with a composite primary key and secondary indexes.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Writes the item, replacing any item with the same primary key.
    async fn put_item(&self, table: &str, item: Item) -> Result<(), StoreError>;

    /// Returns every item matching the key condition, sorted by the sort key.
    async fn query(&self, query: &KeyQuery) -> Result<Vec<Item>, StoreError>;

    /// Whether the store can serve requests.
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct IndexDefinition {
    partition_attribute: String,
    sort_attribute: String,
}

type Table = BTreeMap<(String, String), Item>;

/// Process-local store for development runs and tests.
///
/// Indexes are sparse: items without the index partition attribute are not
/// returned by index queries.
#[derive(Debug, Default)]
pub struct InMemoryKeyValueStore {
    tables: RwLock<HashMap<String, Table>>,
    indexes: HashMap<String, IndexDefinition>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a secondary index.
    pub fn with_index(
        mut self,
        name: impl Into<String>,
        partition_attribute: impl Into<String>,
        sort_attribute: impl Into<String>,
    ) -> Self {
        self.indexes.insert(
            name.into(),
            IndexDefinition {
                partition_attribute: partition_attribute.into(),
                sort_attribute: sort_attribute.into(),
            },
        );
        self
    }

    /// Number of items in a table.
    pub async fn item_count(&self, table: &str) -> usize {
        self.tables
            .read()
            .await
            .get(table)
            .map(BTreeMap::len)
            .unwrap_or(0)
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn put_item(&self, table: &str, item: Item) -> Result<(), StoreError> {
        let pk = string_attribute(&item, PARTITION_KEY)
            .ok_or(StoreError::MissingKey(PARTITION_KEY))?
            .to_string();
        let sk = string_attribute(&item, SORT_KEY)
            .ok_or(StoreError::MissingKey(SORT_KEY))?
            .to_string();

        self.tables
            .write()
            .await
            .entry(table.to_string())
            .or_default()
            .insert((pk, sk), item);
        Ok(())
    }

    async fn query(&self, query: &KeyQuery) -> Result<Vec<Item>, StoreError> {
        let sort_attribute = match &query.index {
            Some(name) => {
                let index = self
                    .indexes
                    .get(name)
                    .ok_or_else(|| StoreError::UnknownIndex(name.clone()))?;
                if index.partition_attribute != query.partition_attribute {
                    return Err(StoreError::UnknownIndex(format!(
                        "{} has no partition attribute {}",
                        name, query.partition_attribute
                    )));
                }
                index.sort_attribute.as_str()
            }
            None => SORT_KEY,
        };

        let tables = self.tables.read().await;
        let Some(table) = tables.get(&query.table) else {
            return Ok(Vec::new());
        };

        let mut items: Vec<Item> = table
            .values()
            .filter(|item| {
                string_attribute(item, &query.partition_attribute)
                    == Some(query.partition_value.as_str())
            })
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            string_attribute(a, sort_attribute).cmp(&string_attribute(b, sort_attribute))
        });

        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::AttributeValue;

    fn item(pairs: &[(&str, &str)]) -> Item {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), AttributeValue::S(value.to_string())))
            .collect()
    }

    fn store() -> InMemoryKeyValueStore {
        InMemoryKeyValueStore::new().with_index("GSI_TrafficType", "GSI_PK", "GSI_SK")
    }

    #[tokio::test]
    async fn test_put_is_upsert_on_primary_key() {
        let store = store();
        store
            .put_item("t", item(&[("PK", "A"), ("SK", "1"), ("v", "first")]))
            .await
            .unwrap();
        store
            .put_item("t", item(&[("PK", "A"), ("SK", "1"), ("v", "second")]))
            .await
            .unwrap();

        let items = store.query(&KeyQuery::table("t", "A")).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(string_attribute(&items[0], "v"), Some("second"));
        assert_eq!(store.item_count("t").await, 1);
    }

    #[tokio::test]
    async fn test_put_requires_keys() {
        let store = store();
        assert!(matches!(
            store.put_item("t", item(&[("SK", "1")])).await,
            Err(StoreError::MissingKey("PK"))
        ));
        assert!(matches!(
            store.put_item("t", item(&[("PK", "A")])).await,
            Err(StoreError::MissingKey("SK"))
        ));
    }

    #[tokio::test]
    async fn test_query_sorted_by_sort_key() {
        let store = store();
        for sk in ["c", "a", "b"] {
            store
                .put_item("t", item(&[("PK", "A"), ("SK", sk)]))
                .await
                .unwrap();
        }
        store
            .put_item("t", item(&[("PK", "B"), ("SK", "a")]))
            .await
            .unwrap();

        let items = store.query(&KeyQuery::table("t", "A")).await.unwrap();
        let keys: Vec<_> = items
            .iter()
            .filter_map(|i| string_attribute(i, "SK"))
            .collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_index_query_is_sparse() {
        let store = store();
        store
            .put_item(
                "t",
                item(&[("PK", "A"), ("SK", "1"), ("GSI_PK", "X"), ("GSI_SK", "2")]),
            )
            .await
            .unwrap();
        store
            .put_item(
                "t",
                item(&[("PK", "B"), ("SK", "1"), ("GSI_PK", "X"), ("GSI_SK", "1")]),
            )
            .await
            .unwrap();
        store
            .put_item("t", item(&[("PK", "C"), ("SK", "1")]))
            .await
            .unwrap();

        let items = store
            .query(&KeyQuery::index("t", "GSI_TrafficType", "GSI_PK", "X"))
            .await
            .unwrap();
        let partitions: Vec<_> = items
            .iter()
            .filter_map(|i| string_attribute(i, "PK"))
            .collect();
        assert_eq!(partitions, vec!["B", "A"]);
    }

    #[tokio::test]
    async fn test_unknown_index() {
        let store = store();
        assert!(matches!(
            store
                .query(&KeyQuery::index("t", "GSI_Other", "GSI_PK", "X"))
                .await,
            Err(StoreError::UnknownIndex(_))
        ));
    }

    #[tokio::test]
    async fn test_query_missing_table_is_empty() {
        let store = store();
        assert!(store
            .query(&KeyQuery::table("missing", "A"))
            .await
            .unwrap()
            .is_empty());
        assert!(store.ping().await.is_ok());
    }
}
