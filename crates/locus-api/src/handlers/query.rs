use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::Json;

use locus_engine::{QueryRequest, QueryResponse};

use crate::dto::QueryParams;
use crate::error::ApiError;
use crate::state::AppState;

/// Wall-clock budget for one query request.
const QUERY_TIMEOUT: Duration = Duration::from_secs(30);

pub async fn query(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Result<Json<QueryResponse>, ApiError> {
    run(state, params, None).await
}

pub async fn query_package(
    State(state): State<AppState>,
    Path(package_id): Path<String>,
    Query(params): Query<QueryParams>,
) -> Result<Json<QueryResponse>, ApiError> {
    run(state, params, Some(package_id)).await
}

async fn run(
    state: AppState,
    params: QueryParams,
    package_id: Option<String>,
) -> Result<Json<QueryResponse>, ApiError> {
    let coordinate = params.coordinate(state.default_srid)?;

    tracing::info!(
        x = coordinate.x,
        y = coordinate.y,
        srid = coordinate.srid,
        package_id = package_id.as_deref().unwrap_or("*"),
        "Processing point query"
    );

    let request = QueryRequest {
        coordinate,
        properties: params.property_list(),
        package_id,
        timeout: Some(QUERY_TIMEOUT),
    };

    let response = state.query_service.execute(request).await?;
    Ok(Json(response))
}
