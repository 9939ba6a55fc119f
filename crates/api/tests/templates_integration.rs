//! Integration tests for template reads and health probes.
//!
//! Run with: cargo test --test templates_integration

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::Router;
use common::{
    create_test_app, get_request, in_memory_store, notification_request, parse_response_body,
    storage_event, train_delayed_document, MapObjectStore, UnavailableStore, CONTAINER,
};
use serde_json::Value;
use tower::ServiceExt;

/// App with three ingested templates across two traffic types.
async fn seeded_app() -> Router {
    let objects = Arc::new(MapObjectStore::default());
    let documents = [
        ("a.json", "1", ("LONG_DISTANCE", "Kaukoliikenne")),
        ("b.json", "2", ("LONG_DISTANCE", "Kaukoliikenne")),
        ("c.json", "3", ("COMMUTER", "Lähiliikenne")),
    ];
    for (key, id, traffic_type) in documents {
        objects
            .insert(CONTAINER, key, train_delayed_document(id, traffic_type))
            .await;
    }

    let app = create_test_app(objects, in_memory_store());
    for (key, _, _) in documents {
        let response = app
            .clone()
            .oneshot(notification_request(storage_event(CONTAINER, key)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    app
}

fn ids(templates: &Value) -> Vec<&str> {
    templates
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_str().unwrap())
        .collect()
}

// ============================================================================
// Template reads
// ============================================================================

#[tokio::test]
async fn test_get_template_not_found() {
    let app = create_test_app(Arc::new(MapObjectStore::default()), in_memory_store());

    let response = app
        .oneshot(get_request("/api/v1/templates/does-not-exist"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = parse_response_body(response).await;
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_list_templates_by_traffic_type() {
    let app = seeded_app().await;

    let response = app
        .clone()
        .oneshot(get_request("/api/v1/traffic-types/LONG_DISTANCE/templates"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let templates = parse_response_body(response).await;
    assert_eq!(ids(&templates), vec!["1", "2"]);

    let response = app
        .oneshot(get_request("/api/v1/traffic-types/COMMUTER/templates"))
        .await
        .unwrap();
    let templates = parse_response_body(response).await;
    assert_eq!(ids(&templates), vec!["3"]);
}

#[tokio::test]
async fn test_list_unknown_traffic_type_is_empty() {
    let app = seeded_app().await;

    let response = app
        .oneshot(get_request("/api/v1/traffic-types/CARGO/templates"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let templates = parse_response_body(response).await;
    assert_eq!(templates, Value::Array(Vec::new()));
}

#[tokio::test]
async fn test_store_failure_on_read_is_internal_error() {
    let app = create_test_app(Arc::new(MapObjectStore::default()), Arc::new(UnavailableStore));

    let response = app
        .oneshot(get_request("/api/v1/templates/1"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

// ============================================================================
// Health and tracing
// ============================================================================

#[tokio::test]
async fn test_health_check_healthy() {
    let app = create_test_app(Arc::new(MapObjectStore::default()), in_memory_store());

    let response = app.oneshot(get_request("/api/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["store"]["backend"], "memory");
    assert_eq!(body["store"]["connected"], true);
    assert_eq!(body["queue"]["enabled"], false);
}

#[tokio::test]
async fn test_health_probes_with_store_down() {
    let app = create_test_app(Arc::new(MapObjectStore::default()), Arc::new(UnavailableStore));

    let response = app
        .clone()
        .oneshot(get_request("/api/health"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = parse_response_body(response).await;
    assert_eq!(body["error"], "service_unavailable");

    let response = app
        .clone()
        .oneshot(get_request("/api/health/ready"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = parse_response_body(response).await;
    assert_eq!(body["error"], "service_unavailable");

    let response = app.oneshot(get_request("/api/health/live")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_ready_probe() {
    let app = create_test_app(Arc::new(MapObjectStore::default()), in_memory_store());

    let response = app.oneshot(get_request("/api/health/ready")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let app = create_test_app(Arc::new(MapObjectStore::default()), in_memory_store());

    let response = app.oneshot(get_request("/api/health/live")).await.unwrap();

    assert!(response.headers().contains_key("x-request-id"));
}
