//! Common test utilities for integration tests.
//!
//! The app under test runs on the in-memory key-value store and a map-backed
//! object store, so no AWS services are needed.

// Not every helper is used by every test binary.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request},
    Router,
};
use domain::errors::ObjectStoreError;
use domain::services::ObjectStore;
use persistence::item::Item;
use persistence::kv_store::{InMemoryKeyValueStore, KeyQuery, KeyValueStore, StoreError};
use serde_json::{json, Value};
use template_sync_api::{
    app::{create_app, AppState},
    config::{
        AwsConfig, Config, LoggingConfig, ObjectStoreConfig, QueueConfig, ServerConfig,
        StoreConfig,
    },
};
use tokio::sync::RwLock;

pub const TABLE_NAME: &str = "message-templates";
pub const TRAFFIC_TYPE_INDEX: &str = "GSI_TrafficType";
pub const CONTAINER: &str = "cms-content";

/// Test configuration backed by the in-memory store.
pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            request_timeout_secs: 30,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
        aws: AwsConfig {
            region: "eu-north-1".to_string(),
            endpoint: None,
            access_key_id: "test".to_string(),
            secret_access_key: "test".to_string(),
            session_token: None,
        },
        object_store: ObjectStoreConfig {
            force_path_style: true,
        },
        queue: QueueConfig {
            enabled: false,
            queue_url: String::new(),
            max_messages: 10,
            wait_time_secs: 0,
            max_in_flight: 4,
            error_backoff_ms: 10,
        },
        store: StoreConfig {
            backend: "memory".to_string(),
            table_name: TABLE_NAME.to_string(),
            traffic_type_index: TRAFFIC_TYPE_INDEX.to_string(),
        },
    }
}

/// Object store over a map of `(container, key)` → bytes.
#[derive(Default)]
pub struct MapObjectStore {
    objects: RwLock<HashMap<(String, String), Vec<u8>>>,
}

impl MapObjectStore {
    pub async fn insert(&self, container: &str, key: &str, body: Value) {
        self.objects.write().await.insert(
            (container.to_string(), key.to_string()),
            body.to_string().into_bytes(),
        );
    }

    pub async fn insert_raw(&self, container: &str, key: &str, bytes: &[u8]) {
        self.objects
            .write()
            .await
            .insert((container.to_string(), key.to_string()), bytes.to_vec());
    }
}

#[async_trait]
impl ObjectStore for MapObjectStore {
    async fn get(&self, container: &str, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
        self.objects
            .read()
            .await
            .get(&(container.to_string(), key.to_string()))
            .cloned()
            .ok_or(ObjectStoreError::NotFound)
    }
}

/// Key-value store whose every call fails.
pub struct UnavailableStore;

#[async_trait]
impl KeyValueStore for UnavailableStore {
    async fn put_item(&self, _table: &str, _item: Item) -> Result<(), StoreError> {
        Err(StoreError::Transport("connection refused".to_string()))
    }

    async fn query(&self, _query: &KeyQuery) -> Result<Vec<Item>, StoreError> {
        Err(StoreError::Transport("connection refused".to_string()))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Err(StoreError::Transport("connection refused".to_string()))
    }
}

pub fn in_memory_store() -> Arc<InMemoryKeyValueStore> {
    Arc::new(InMemoryKeyValueStore::new().with_index(TRAFFIC_TYPE_INDEX, "GSI_PK", "GSI_SK"))
}

/// Builds the app over the given backends.
pub fn create_test_app(objects: Arc<MapObjectStore>, store: Arc<dyn KeyValueStore>) -> Router {
    create_app(AppState::new(test_config(), objects, store))
}

/// Builds a POST request carrying a raw notification body.
pub fn notification_request(body: impl Into<String>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/v1/notifications")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.into()))
        .unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Helper to parse JSON response body.
pub async fn parse_response_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(Value::Null)
}

/// Storage event in the raw notification shape.
pub fn storage_event(container: &str, key: &str) -> String {
    json!({
        "Records": [{
            "eventVersion": "2.1",
            "eventSource": "aws:s3",
            "eventName": "ObjectCreated:Put",
            "s3": {
                "bucket": {"name": container},
                "object": {"key": key, "size": 1024}
            }
        }]
    })
    .to_string()
}

/// Change notification in the primary shape.
pub fn change_notification(locations: &[(&str, &str)]) -> String {
    let records: Vec<Value> = locations
        .iter()
        .enumerate()
        .map(|(i, (container, key))| {
            json!({
                "messageId": format!("msg-{i}"),
                "s3": {"bucket": {"name": container}, "object": {"key": key}}
            })
        })
        .collect();
    json!({ "records": records }).to_string()
}

fn text(value: &str) -> Value {
    json!({"nodeType": "text", "value": value, "marks": [], "data": {}})
}

fn param(id: &str) -> Value {
    json!({
        "nodeType": "embedded-entry-inline",
        "content": [],
        "data": {"target": {"sys": {"id": id, "type": "Link", "linkType": "Entry"}}}
    })
}

fn paragraph(content: Vec<Value>) -> Value {
    json!({"nodeType": "paragraph", "data": {}, "content": content})
}

fn document(paragraphs: Vec<Value>) -> Value {
    json!({"nodeType": "document", "data": {}, "content": paragraphs})
}

fn included(id: &str, key: &str, name: &str) -> Value {
    json!({"sys": {"id": id, "type": "Entry"}, "fields": {"key": key, "name": name}})
}

/// CMS response for a "train delayed" template of the given traffic type.
pub fn train_delayed_document(id: &str, traffic_type: (&str, &str)) -> Value {
    json!({
        "sys": {"type": "Array"},
        "total": 1,
        "skip": 0,
        "limit": 100,
        "items": [{
            "sys": {"id": id, "type": "Entry"},
            "fields": {
                "key": "TRAIN_DELAYED",
                "name": "Juna myöhässä",
                "trafficType": {"sys": {"id": "tt-1", "type": "Link", "linkType": "Entry"}},
                "subject": document(vec![paragraph(vec![
                    param("p-type"),
                    text(" "),
                    param("p-number"),
                    text(" - delayed"),
                ])]),
                "body": document(vec![
                    paragraph(vec![
                        text("Dear passengers, train "),
                        param("p-type"),
                        text(" "),
                        param("p-number"),
                        text(" is delayed due to "),
                        param("p-reason"),
                        text("."),
                    ]),
                    paragraph(vec![text("We apologise...")]),
                ])
            }
        }],
        "includes": {"Entry": [
            included("tt-1", traffic_type.0, traffic_type.1),
            included("p-type", "TRAIN_TYPE", "Junatyyppi"),
            included("p-number", "TRAIN_NUMBER", "Junanumero"),
            included("p-reason", "DELAY_REASON", "Myöhästymisen syy"),
        ]}
    })
}
