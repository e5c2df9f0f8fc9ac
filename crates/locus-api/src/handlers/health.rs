use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::dto::response::{ComponentHealth, HealthComponents};
use crate::dto::HealthResponse;
use crate::state::AppState;

/// Liveness: OK once the process is up.
pub async fn live() -> impl IntoResponse {
    StatusCode::OK
}

/// Readiness: an empty registry is still a valid state to serve from;
/// only "packages exist but none are ready yet" answers 503.
pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    if is_ready(&state).await {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let packages_loaded = state.registry.count().await;
    let packages_ready = state.registry.ready_count().await;

    Json(HealthResponse {
        healthy: true,
        ready: packages_loaded == 0 || packages_ready > 0,
        packages_loaded,
        packages_ready,
        components: HealthComponents {
            storage: ComponentHealth {
                status: "ok".to_string(),
                backend: format!("{:?}", state.storage_kind).to_lowercase(),
            },
        },
        sync: state.scheduler.status().await,
    })
}

async fn is_ready(state: &AppState) -> bool {
    let loaded = state.registry.count().await;
    loaded == 0 || state.registry.ready_count().await > 0
}
