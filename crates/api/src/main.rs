use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use template_sync_api::{
    app::{create_app, AppState},
    config::Config,
    jobs::{ConsumerSettings, QueueConsumer},
    middleware::{init_metrics, logging::init_logging},
    services::{S3Config, S3ObjectStore, SqsConfig, SqsQueue},
};

const CONSUMER_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = Config::load()?;

    init_logging(&config.logging);
    init_metrics().context("Failed to install Prometheus recorder")?;

    info!("Starting Template Sync v{}", env!("CARGO_PKG_VERSION"));

    let store = persistence::db::create_store(&config.database_config())
        .context("Failed to create key-value store")?;

    let objects = S3ObjectStore::new(S3Config {
        region: config.aws.region.clone(),
        endpoint: config.aws.endpoint.clone(),
        credentials: config.aws.credentials(),
        force_path_style: config.object_store.force_path_style,
        timeout: config.request_timeout(),
    })
    .context("Failed to create object store client")?;

    let state = AppState::new(config.clone(), Arc::new(objects), store);

    let consumer = if config.queue.enabled {
        let queue = SqsQueue::new(SqsConfig {
            region: config.aws.region.clone(),
            endpoint: config.aws.endpoint.clone(),
            credentials: config.aws.credentials(),
            queue_url: config.queue.queue_url.clone(),
            request_timeout: config.request_timeout(),
            wait_time_secs: config.queue.wait_time_secs,
        })
        .context("Failed to create queue client")?;

        let mut consumer = QueueConsumer::new(
            Arc::new(queue),
            state.ingestor.clone(),
            ConsumerSettings::from(&config.queue),
        );
        consumer.start();
        Some(consumer)
    } else {
        info!("Queue consumer disabled");
        None
    };

    let app = create_app(state);

    let addr = config.socket_addr()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(consumer) = consumer {
        consumer.shutdown();
        consumer.wait_for_shutdown(CONSUMER_SHUTDOWN_TIMEOUT).await;
    }

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
