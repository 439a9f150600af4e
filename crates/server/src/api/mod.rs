//! REST API layer: router construction and the handler modules.

/// API error type mapped to HTTP status codes.
pub mod errors;
/// HTTP request handlers and shared application state.
pub mod handlers;
/// Request and response data transfer objects.
pub mod models;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, patch, post};
use axum::Router;
use handlers::AppState;
use shardvec_core::config;

/// Builds the application router over the shared state.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/vectors", post(handlers::insert_vector))
        .route(
            "/vectors/:id",
            get(handlers::get_vector).delete(handlers::delete_vector),
        )
        .route("/vectors/:id/metadata", patch(handlers::patch_vector_metadata))
        .route("/query/:id", get(handlers::query_vector))
        .route("/search", post(handlers::search))
        .route("/objects", post(handlers::insert_object))
        .route(
            "/objects/:id",
            get(handlers::get_object).delete(handlers::delete_object),
        )
        .route("/objects/:id/metadata", patch(handlers::patch_object_metadata))
        .route("/objects/:id/content", patch(handlers::patch_object_content))
        .layer(DefaultBodyLimit::max(config::MAX_BODY_BYTES))
        .with_state(state)
}
