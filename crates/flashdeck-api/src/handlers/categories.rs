//! Category HTTP handlers.
//!
//! Categories are flat named tag sets; their cards are the cards carrying
//! every category tag.

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
use tracing::info;

use flashdeck_core::{
    CardFindOptions, CategoryId, CategoryRepository, CreateCategoryRequest, UpdateCategoryRequest,
};

use super::{into_labels, TagInput};
use crate::query_types::group_pairs;
use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCategoryBody {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tags: Vec<TagInput>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateCategoryBody {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<TagInput>>,
}

/// Create a category.
///
/// # Returns
/// - 201 Created with `{category}`
/// - 400 Bad Request on validation failure
/// - 409 Conflict if the name is taken
pub async fn create_category(
    State(state): State<AppState>,
    body: Result<Json<CreateCategoryBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = body?;
    let category = state
        .db
        .categories
        .create(CreateCategoryRequest {
            name: body.name,
            tags: into_labels(body.tags),
        })
        .await?;

    info!(
        subsystem = "api",
        component = "categories",
        op = "create",
        category_id = category.category_id,
        "Category created"
    );
    Ok((StatusCode::CREATED, Json(json!({ "category": category }))))
}

pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let categories = state.db.categories.list().await?;
    Ok(Json(json!({ "categories": categories })))
}

pub async fn get_category(
    State(state): State<AppState>,
    path: Result<Path<CategoryId>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = path?;
    let category = state.db.categories.get(id).await?;
    Ok(Json(json!({ "category": category })))
}

/// Rename a category and/or replace its tags.
///
/// # Returns
/// - 200 OK with `{category}`
/// - 400 / 404 / 409
pub async fn update_category(
    State(state): State<AppState>,
    path: Result<Path<CategoryId>, PathRejection>,
    body: Result<Json<UpdateCategoryBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = path?;
    let Json(body) = body?;
    let category = state
        .db
        .categories
        .update(
            id,
            UpdateCategoryRequest {
                name: body.name,
                tags: body.tags.map(into_labels),
            },
        )
        .await?;
    Ok(Json(json!({ "category": category })))
}

pub async fn delete_category(
    State(state): State<AppState>,
    path: Result<Path<CategoryId>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = path?;
    let count = state.db.categories.delete(id).await?;
    Ok(Json(json!({ "count": count })))
}

/// Cards in a category.
///
/// # Query Parameters
/// - `tagsAll`, `tagsNone`, `limit`, `offset` as for card finds; `tagsAll`
///   narrows within the category.
///
/// # Returns
/// - 200 OK with `{cards}`
/// - 400 Bad Request on unknown or malformed parameters
/// - 404 Not Found
pub async fn list_category_cards(
    State(state): State<AppState>,
    path: Result<Path<CategoryId>, PathRejection>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = path?;
    let Query(pairs) = query?;
    let options = CardFindOptions::parse(&group_pairs(pairs))?;

    let cards = state.db.categories.cards(id, &options).await?;
    Ok(Json(json!({ "cards": cards })))
}
