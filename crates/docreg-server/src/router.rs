use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handler;
use crate::state::AppState;

/// Build the axum router with all registry endpoints.
pub fn build_router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/v1/health", get(handler::health))
        .route("/v1/supply", get(handler::supply))
        .route(
            "/v1/files/:filename",
            get(handler::get_file)
                .put(handler::put_file)
                .delete(handler::delete_file),
        )
        .route("/v1/documents/:content_hash", get(handler::get_document))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
