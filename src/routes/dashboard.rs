//! Dashboard routes: aggregated metrics for the admin overview.

use axum::{extract::State, Json};

use crate::errors::{ApiResponse, AppError};
use crate::services::dashboard::{self, DashboardSnapshot, ProjectStats};
use crate::AppState;

/// GET /api/v1/dashboard/stats — current aggregator snapshot.
pub async fn stats(State(state): State<AppState>) -> Json<ApiResponse<DashboardSnapshot>> {
    ApiResponse::success(state.aggregator.snapshot())
}

/// POST /api/v1/dashboard/refresh — on-demand refetch, returns the new snapshot.
pub async fn refresh(State(state): State<AppState>) -> Json<ApiResponse<DashboardSnapshot>> {
    state.aggregator.refresh().await;
    ApiResponse::success(state.aggregator.snapshot())
}

/// GET /api/v1/dashboard/projects/stats — analytics over the full project set.
pub async fn project_stats(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ProjectStats>>, AppError> {
    let stats = dashboard::project_stats(state.store.as_ref()).await?;
    Ok(ApiResponse::success(stats))
}
