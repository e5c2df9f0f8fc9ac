use axum::extract::{Path, State};
use axum::Json;

use crate::dto::{LayersResponse, PackageDetail, PackageListResponse, PackageSummary};
use crate::error::ApiError;
use crate::state::AppState;

pub async fn list_packages(State(state): State<AppState>) -> Json<PackageListResponse> {
    let entries = state.registry.list().await;
    let packages: Vec<PackageSummary> = entries.iter().map(PackageSummary::from).collect();
    let count = packages.len();

    Json(PackageListResponse { packages, count })
}

pub async fn get_package(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PackageDetail>, ApiError> {
    let entry = state
        .registry
        .get(&id)
        .await
        .ok_or_else(|| ApiError::not_found(format!("package '{id}' is not loaded")))?;

    Ok(Json(PackageDetail::from(&entry)))
}

pub async fn get_package_layers(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LayersResponse>, ApiError> {
    let entry = state
        .registry
        .get(&id)
        .await
        .ok_or_else(|| ApiError::not_found(format!("package '{id}' is not loaded")))?;

    Ok(Json(LayersResponse {
        package_id: entry.package.id,
        layers: entry.package.layers,
    }))
}
