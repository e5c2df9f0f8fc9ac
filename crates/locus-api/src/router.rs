use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Create the API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/health", get(handlers::health))
        .route("/health/live", get(handlers::live))
        .route("/health/ready", get(handlers::ready))

        // Point queries
        .route("/api/v1/query", get(handlers::query))
        .route("/api/v1/query/:package_id", get(handlers::query_package))

        // Registry listing
        .route("/api/v1/packages", get(handlers::list_packages))
        .route("/api/v1/packages/:id", get(handlers::get_package))
        .route("/api/v1/packages/:id/layers", get(handlers::get_package_layers))

        // Reconciliation
        .route("/api/v1/sync", post(handlers::trigger_sync))

        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
