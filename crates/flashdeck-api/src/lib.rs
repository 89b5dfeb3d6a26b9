//! flashdeck-api - HTTP API server for flashdeck
//!
//! The router is built here so tests can drive it in-process; `main.rs`
//! only wires configuration, logging, and the listener.

pub mod config;
pub mod error;
pub mod handlers;
pub mod query_types;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use uuid::Uuid;

use flashdeck_db::Database;

pub use config::ServerConfig;
pub use error::ApiError;

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
pub struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

// =============================================================================
// APPLICATION STATE
// =============================================================================

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

// =============================================================================
// ROUTER
// =============================================================================

/// Build the application router.
pub fn create_router(state: AppState, max_body_bytes: usize) -> Router {
    use handlers::{cards, categories, health, tags};

    Router::new()
        .route("/health", get(health::health_check))
        // Cards
        .route(
            "/api/v1/cards",
            post(cards::create_card).get(cards::list_cards),
        )
        .route(
            "/api/v1/cards/:card_id",
            get(cards::get_card)
                .patch(cards::update_card)
                .delete(cards::delete_card),
        )
        .route(
            "/api/v1/cards/:card_id/tags",
            get(cards::get_card_tags).put(cards::set_card_tags),
        )
        // Tags
        .route("/api/v1/tags", get(tags::list_tags))
        .route("/api/v1/tags/:tag", get(tags::get_tag))
        // Categories
        .route(
            "/api/v1/categories",
            post(categories::create_category).get(categories::list_categories),
        )
        .route(
            "/api/v1/categories/:category_id",
            get(categories::get_category)
                .patch(categories::update_category)
                .delete(categories::delete_category),
        )
        .route(
            "/api/v1/categories/:category_id/cards",
            get(categories::list_category_cards),
        )
        .fallback(handlers::fallback)
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .with_state(state)
}
