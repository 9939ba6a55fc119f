use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use domain::services::{EventIngestor, ObjectStore};
use persistence::kv_store::KeyValueStore;
use persistence::repositories::MessageTemplateRepository;
use std::sync::Arc;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::Config;
use crate::middleware::{metrics_handler, metrics_middleware, trace_id};
use crate::routes::{health, notifications, templates};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub ingestor: Arc<EventIngestor>,
    pub templates: Arc<MessageTemplateRepository>,
}

impl AppState {
    /// Wires the ingestion pipeline and template repository over the given backends.
    pub fn new(
        config: Config,
        objects: Arc<dyn ObjectStore>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let templates = Arc::new(MessageTemplateRepository::new(
            store,
            &config.store.table_name,
            &config.store.traffic_type_index,
        ));
        let ingestor = Arc::new(EventIngestor::new(objects, templates.clone()));

        Self {
            config: Arc::new(config),
            ingestor,
            templates,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let request_timeout = state.config.request_timeout();

    let api_routes = Router::new()
        .route(
            "/api/v1/notifications",
            post(notifications::ingest_notification),
        )
        .route("/api/v1/templates/:id", get(templates::get_template))
        .route(
            "/api/v1/traffic-types/:key/templates",
            get(templates::list_templates_by_traffic_type),
        );

    // Health and metrics for probes and scrapers
    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/live", get(health::live))
        .route("/api/health/ready", get(health::ready))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .with_state(state)
}
