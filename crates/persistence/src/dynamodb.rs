//! DynamoDB client over the JSON protocol.
//!
//! Requests are `POST /` with an `X-Amz-Target` header naming the operation
//! and a SigV4 signature. Queries follow `LastEvaluatedKey` until the result
//! set is exhausted.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use shared::aws::{AwsCredentials, JsonProtocolClient, JsonProtocolConfig, JsonProtocolError};

use crate::item::Item;
use crate::kv_store::{KeyQuery, KeyValueStore, StoreError};

const SERVICE: &str = "dynamodb";
const TARGET_PREFIX: &str = "DynamoDB_20120810";

/// Connection settings for [`DynamoDbClient`].
#[derive(Debug, Clone)]
pub struct DynamoDbConfig {
    pub region: String,
    /// Overrides the regional endpoint, e.g. `http://localhost:8000`.
    pub endpoint: Option<String>,
    pub credentials: AwsCredentials,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct DynamoDbClient {
    client: JsonProtocolClient,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct QueryOutput {
    #[serde(default)]
    items: Vec<Item>,
    #[serde(default)]
    last_evaluated_key: Option<Item>,
}

impl DynamoDbClient {
    pub fn new(config: DynamoDbConfig) -> Result<Self, StoreError> {
        let client = JsonProtocolClient::new(JsonProtocolConfig {
            service: SERVICE,
            target_prefix: TARGET_PREFIX,
            region: config.region,
            endpoint: config.endpoint,
            credentials: config.credentials,
            timeout: config.timeout,
        })?;

        Ok(Self { client })
    }
}

impl From<JsonProtocolError> for StoreError {
    fn from(err: JsonProtocolError) -> Self {
        match err {
            JsonProtocolError::Transport(message) => StoreError::Transport(message),
            JsonProtocolError::Service {
                status,
                error_type,
                message,
            } => StoreError::Service {
                status,
                error_type,
                message,
            },
            JsonProtocolError::InvalidResponse(message) => StoreError::InvalidResponse(message),
            JsonProtocolError::Signing(e) => StoreError::Signing(e),
        }
    }
}

#[async_trait]
impl KeyValueStore for DynamoDbClient {
    async fn put_item(&self, table: &str, item: Item) -> Result<(), StoreError> {
        let _: Value = self.client.call("PutItem", &put_item_request(table, &item)).await?;
        Ok(())
    }

    async fn query(&self, query: &KeyQuery) -> Result<Vec<Item>, StoreError> {
        let mut items = Vec::new();
        let mut start_key: Option<Item> = None;

        loop {
            let page: QueryOutput = self
                .client
                .call("Query", &query_request(query, start_key.as_ref()))
                .await?;
            items.extend(page.items);

            match page.last_evaluated_key {
                Some(key) => start_key = Some(key),
                None => break,
            }
        }

        Ok(items)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let _: Value = self.client.call("ListTables", &json!({"Limit": 1})).await?;
        Ok(())
    }
}

fn put_item_request(table: &str, item: &Item) -> Value {
    json!({
        "TableName": table,
        "Item": item,
    })
}

fn query_request(query: &KeyQuery, start_key: Option<&Item>) -> Value {
    let mut request = json!({
        "TableName": query.table,
        "KeyConditionExpression": "#pk = :pk",
        "ExpressionAttributeNames": {"#pk": query.partition_attribute},
        "ExpressionAttributeValues": {":pk": {"S": query.partition_value}},
    });
    if let Some(index) = &query.index {
        request["IndexName"] = json!(index);
    }
    if let Some(key) = start_key {
        request["ExclusiveStartKey"] = json!(key);
    }
    request
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::AttributeValue;

    fn config(endpoint: Option<&str>) -> DynamoDbConfig {
        DynamoDbConfig {
            region: "eu-north-1".to_string(),
            endpoint: endpoint.map(str::to_string),
            credentials: AwsCredentials::new("AKID", "secret"),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_default_endpoint() {
        let client = DynamoDbClient::new(config(None)).unwrap();
        assert_eq!(client.client.host(), "dynamodb.eu-north-1.amazonaws.com");
        assert_eq!(client.client.url().scheme(), "https");
    }

    #[test]
    fn test_endpoint_override_keeps_port() {
        let client = DynamoDbClient::new(config(Some("http://localhost:8000"))).unwrap();
        assert_eq!(client.client.host(), "localhost:8000");
    }

    #[test]
    fn test_invalid_endpoint() {
        assert!(matches!(
            DynamoDbClient::new(config(Some("not a url"))),
            Err(StoreError::Transport(_))
        ));
    }

    #[test]
    fn test_query_request_on_index() {
        let query = KeyQuery::index("templates", "GSI_TrafficType", "GSI_PK", "TRAFFICTYPE#X");
        let request = query_request(&query, None);

        assert_eq!(request["TableName"], "templates");
        assert_eq!(request["IndexName"], "GSI_TrafficType");
        assert_eq!(request["KeyConditionExpression"], "#pk = :pk");
        assert_eq!(request["ExpressionAttributeNames"]["#pk"], "GSI_PK");
        assert_eq!(
            request["ExpressionAttributeValues"][":pk"],
            json!({"S": "TRAFFICTYPE#X"})
        );
        assert!(request.get("ExclusiveStartKey").is_none());
    }

    #[test]
    fn test_query_request_continues_from_start_key() {
        let mut start = Item::new();
        start.insert("PK".to_string(), AttributeValue::S("TEMPLATE#1".to_string()));

        let request = query_request(&KeyQuery::table("templates", "TEMPLATE#1"), Some(&start));
        assert!(request.get("IndexName").is_none());
        assert_eq!(request["ExclusiveStartKey"]["PK"], json!({"S": "TEMPLATE#1"}));
    }

    #[test]
    fn test_put_item_request() {
        let mut item = Item::new();
        item.insert("PK".to_string(), AttributeValue::S("TEMPLATE#1".to_string()));

        let request = put_item_request("templates", &item);
        assert_eq!(request["TableName"], "templates");
        assert_eq!(request["Item"]["PK"], json!({"S": "TEMPLATE#1"}));
    }

    #[test]
    fn test_query_output_pages() {
        let output: QueryOutput = serde_json::from_value(json!({
            "Count": 1,
            "Items": [{"PK": {"S": "A"}}],
            "LastEvaluatedKey": {"PK": {"S": "A"}}
        }))
        .unwrap();
        assert_eq!(output.items.len(), 1);
        assert!(output.last_evaluated_key.is_some());

        let last: QueryOutput = serde_json::from_value(json!({"Count": 0})).unwrap();
        assert!(last.items.is_empty());
        assert!(last.last_evaluated_key.is_none());
    }

    #[test]
    fn test_service_error_maps_to_store_error() {
        let error = StoreError::from(JsonProtocolError::Service {
            status: 400,
            error_type: "ResourceNotFoundException".to_string(),
            message: "Requested resource not found".to_string(),
        });
        match error {
            StoreError::Service {
                status,
                error_type,
                message,
            } => {
                assert_eq!(status, 400);
                assert_eq!(error_type, "ResourceNotFoundException");
                assert_eq!(message, "Requested resource not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert!(matches!(
            StoreError::from(JsonProtocolError::Transport("refused".to_string())),
            StoreError::Transport(_)
        ));
    }
}
