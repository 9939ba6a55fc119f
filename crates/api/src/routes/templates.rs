//! Message template read endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use domain::models::MessageTemplate;
use domain::services::TemplateStore;

use crate::app::AppState;
use crate::error::ApiError;

/// Get a message template by its CMS entry id.
///
/// GET /api/v1/templates/:id
pub async fn get_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageTemplate>, ApiError> {
    state
        .templates
        .find_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Template {} not found", id)))
}

/// List the message templates of one traffic type.
///
/// GET /api/v1/traffic-types/:key/templates
pub async fn list_templates_by_traffic_type(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<Vec<MessageTemplate>>, ApiError> {
    let templates = state.templates.find_by_traffic_type(&key).await?;
    Ok(Json(templates))
}
