//! Push-mode notification ingest.
//!
//! The HTTP response doubles as the acknowledgement: a 200 tells the caller
//! the notification was fully processed, any error status tells it to
//! redeliver.

use axum::{extract::State, Json};
use domain::services::IngestReport;
use tracing::{info, warn};

use crate::app::AppState;
use crate::error::ApiError;

/// Ingest one raw change notification.
///
/// POST /api/v1/notifications
pub async fn ingest_notification(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<IngestReport>, ApiError> {
    let report = state.ingestor.process(&body).await.map_err(|e| {
        warn!(error = %e, kind = e.kind().as_str(), "Notification rejected");
        ApiError::from(e)
    })?;

    info!(
        locations = report.locations,
        saved = report.saved.len(),
        skipped = report.skipped,
        "Notification ingested"
    );

    Ok(Json(report))
}
