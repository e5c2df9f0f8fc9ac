use axum::extract::State;
use axum::Json;

use crate::dto::SyncResponse;
use crate::error::ApiError;
use crate::state::AppState;

/// `POST /api/v1/sync` — trigger reconciliation against the remote store.
/// Triggers inside the cooldown window answer 429 with `Retry-After`.
pub async fn trigger_sync(State(state): State<AppState>) -> Result<Json<SyncResponse>, ApiError> {
    let outcome = state.scheduler.trigger().await?;
    let status = state.scheduler.status().await;

    Ok(Json(SyncResponse {
        packages_added: outcome.added,
        packages_removed: outcome.removed,
        packages_total: state.registry.count().await,
        synced_at: status.last_synced_at,
        next_scheduled_at: status.next_scheduled_at,
    }))
}
