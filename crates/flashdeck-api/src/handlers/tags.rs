//! Tag HTTP handlers.

use axum::{
    extract::{rejection::PathRejection, Path, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;

use flashdeck_core::{Error, TagRepository};

use crate::{ApiError, AppState};

/// List all tags with their card counts, ordered by label.
pub async fn list_tags(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let tags = state.db.tags.list().await?;
    Ok(Json(json!({ "tags": tags })))
}

/// Look up one tag by exact label.
///
/// # Returns
/// - 200 OK with `{tag}` including its card count
/// - 404 Not Found
pub async fn get_tag(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(label) = path?;
    let label = label.trim();
    let tag = state
        .db
        .tags
        .get_by_label(label)
        .await?
        .ok_or_else(|| Error::NotFound(format!("tag '{}'", label)))?;
    Ok(Json(json!({ "tag": tag })))
}
