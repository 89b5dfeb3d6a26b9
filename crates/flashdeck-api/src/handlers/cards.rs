//! Card HTTP handlers.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use flashdeck_core::{
    split_find_input, CardFilter, CardFindOptions, CardId, CardRepository, CreateCardRequest,
    Error, TagRepository, UpdateCardRequest,
};

use super::{deserialize_some, into_labels, TagInput};
use crate::query_types::group_pairs;
use crate::{ApiError, AppState};

/// Request body for card creation.
///
/// `front` and `back` default to empty so that a missing field is reported
/// by validation with the field name.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateCardBody {
    #[serde(default)]
    pub front: String,
    #[serde(default)]
    pub back: String,
    #[serde(default)]
    pub hint: Option<String>,
    #[serde(default)]
    pub tags: Vec<TagInput>,
}

/// Partial update. Only these fields may be patched.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateCardBody {
    /// Accepted only when equal to the path id.
    #[serde(default)]
    pub card_id: Option<CardId>,
    #[serde(default)]
    pub front: Option<String>,
    #[serde(default)]
    pub back: Option<String>,
    /// `null` clears the hint.
    #[serde(default, deserialize_with = "deserialize_some")]
    pub hint: Option<Option<String>>,
    #[serde(default)]
    pub tags: Option<Vec<TagInput>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetTagsBody {
    pub tags: Vec<TagInput>,
}

/// Create a card.
///
/// # Returns
/// - 201 Created with `{card}`
/// - 400 Bad Request on validation failure
pub async fn create_card(
    State(state): State<AppState>,
    body: Result<Json<CreateCardBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = body?;
    let card = state
        .db
        .cards
        .insert(CreateCardRequest {
            front: body.front,
            back: body.back,
            hint: body.hint,
            tags: into_labels(body.tags),
        })
        .await?;

    info!(
        subsystem = "api",
        component = "cards",
        op = "create",
        card_id = card.card_id,
        "Card created"
    );
    Ok((StatusCode::CREATED, Json(json!({ "card": card }))))
}

/// Get one card.
///
/// # Returns
/// - 200 OK with `{card}`
/// - 404 Not Found
pub async fn get_card(
    State(state): State<AppState>,
    path: Result<Path<CardId>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = path?;
    let card = state.db.cards.fetch(id).await?;
    Ok(Json(json!({ "card": card })))
}

/// Find cards.
///
/// # Query Parameters
/// - `cardId`, `front`, `back`, `hint`: exact match
/// - `tagsAll`, `tagsNone`: labels, repeated or comma-separated
/// - `limit` (1..=1000), `offset`
///
/// # Returns
/// - 200 OK with `{cards}` ordered by id
/// - 400 Bad Request on unknown or malformed parameters
pub async fn list_cards(
    State(state): State<AppState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(pairs) = query?;
    let (filter_input, options_input) = split_find_input(group_pairs(pairs));
    let filter = CardFilter::parse(&filter_input)?;
    let options = CardFindOptions::parse(&options_input)?;

    let cards = state.db.cards.find(&filter, &options).await?;
    debug!(
        subsystem = "api",
        component = "cards",
        op = "find",
        result_count = cards.len(),
        "Cards found"
    );
    Ok(Json(json!({ "cards": cards })))
}

/// Patch a card's fields and optionally replace its tags.
///
/// # Returns
/// - 200 OK with the updated `{card}`
/// - 400 Bad Request on validation failure or a mismatched `cardId`
/// - 404 Not Found
pub async fn update_card(
    State(state): State<AppState>,
    path: Result<Path<CardId>, PathRejection>,
    body: Result<Json<UpdateCardBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = path?;
    let Json(body) = body?;

    if let Some(body_id) = body.card_id {
        if body_id != id {
            return Err(Error::invalid_field("cardId", "is immutable").into());
        }
    }

    let card = state
        .db
        .cards
        .update(
            id,
            UpdateCardRequest {
                front: body.front,
                back: body.back,
                hint: body.hint,
                tags: body.tags.map(into_labels),
            },
        )
        .await?;
    Ok(Json(json!({ "card": card })))
}

/// Delete a card.
///
/// # Returns
/// - 200 OK with `{count}`
/// - 404 Not Found
pub async fn delete_card(
    State(state): State<AppState>,
    path: Result<Path<CardId>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = path?;
    let count = state.db.cards.delete(id).await?;

    info!(
        subsystem = "api",
        component = "cards",
        op = "delete",
        card_id = id,
        "Card deleted"
    );
    Ok(Json(json!({ "count": count })))
}

/// Labels on a card.
pub async fn get_card_tags(
    State(state): State<AppState>,
    path: Result<Path<CardId>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = path?;
    let labels = state.db.tags.get_for_card(id).await?;
    let tags: Vec<_> = labels.into_iter().map(|tag| json!({ "tag": tag })).collect();
    Ok(Json(json!({ "tags": tags })))
}

/// Replace a card's tag set, leaving its fields alone.
///
/// # Returns
/// - 200 OK with the updated `{card}`
/// - 400 Bad Request on an invalid label
/// - 404 Not Found
pub async fn set_card_tags(
    State(state): State<AppState>,
    path: Result<Path<CardId>, PathRejection>,
    body: Result<Json<SetTagsBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = path?;
    let Json(body) = body?;

    let summary = state
        .db
        .tags
        .set_for_card(id, into_labels(body.tags))
        .await?;
    debug!(
        subsystem = "api",
        component = "cards",
        op = "set_tags",
        card_id = id,
        tags_created = summary.tags_created,
        links_added = summary.links_added,
        links_removed = summary.links_removed,
        "Card tags replaced"
    );

    let card = state.db.cards.fetch(id).await?;
    Ok(Json(json!({ "card": card })))
}
