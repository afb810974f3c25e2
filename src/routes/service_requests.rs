//! Service request routes: submit, fetch, and confirm.

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::errors::{ApiResponse, AppError};
use crate::models::service_request::{CreateServiceRequest, ServiceRequest};
use crate::services::service_request::{self, SubmitReceipt};
use crate::AppState;

/// POST /api/v1/service-requests — submit a new request.
pub async fn submit(
    State(state): State<AppState>,
    Json(input): Json<CreateServiceRequest>,
) -> Result<Json<ApiResponse<SubmitReceipt>>, AppError> {
    let receipt = service_request::submit(state.store.as_ref(), &input).await?;
    Ok(ApiResponse::success(receipt))
}

/// GET /api/v1/service-requests/{id} — fetch one request.
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ServiceRequest>>, AppError> {
    let request = service_request::get(state.store.as_ref(), id).await?;
    Ok(ApiResponse::success(request))
}

/// POST /api/v1/service-requests/{id}/confirm — confirm via the email link.
pub async fn confirm(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ServiceRequest>>, AppError> {
    let request = service_request::confirm(state.store.as_ref(), id).await?;
    Ok(ApiResponse::success(request))
}
