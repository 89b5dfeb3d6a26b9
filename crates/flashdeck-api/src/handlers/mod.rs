//! HTTP handlers for flashdeck-api.

pub mod cards;
pub mod categories;
pub mod health;
pub mod tags;

use axum::http::{StatusCode, Uri};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Deserializer};
use serde_json::json;

/// A tag in a request body: either `{"tag": "label"}` or a bare `"label"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TagInput {
    Object { tag: String },
    Label(String),
}

impl TagInput {
    pub fn into_label(self) -> String {
        match self {
            TagInput::Object { tag } | TagInput::Label(tag) => tag,
        }
    }
}

pub(crate) fn into_labels(tags: Vec<TagInput>) -> Vec<String> {
    tags.into_iter().map(TagInput::into_label).collect()
}

/// Distinguish an explicit `null` from an absent field.
///
/// Used with `#[serde(default)]`: absent gives `None`, `null` gives
/// `Some(None)`.
pub(crate) fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Fallback for unmatched routes.
pub async fn fallback(uri: Uri) -> impl IntoResponse {
    if uri.path().starts_with("/api/") {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Not a valid endpoint" })),
        )
    } else {
        (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" })))
    }
}
