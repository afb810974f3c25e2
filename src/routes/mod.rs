//! Route definitions for the studiopulse API.

pub mod dashboard;
pub mod health;
pub mod service_requests;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::AppState;

/// Build the full application router.
pub fn api_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/dashboard/stats", get(dashboard::stats))
        .route("/dashboard/refresh", post(dashboard::refresh))
        .route("/dashboard/projects/stats", get(dashboard::project_stats))
        .route("/service-requests", post(service_requests::submit))
        .route("/service-requests/{id}", get(service_requests::get_by_id))
        .route(
            "/service-requests/{id}/confirm",
            post(service_requests::confirm),
        );

    Router::new()
        .route("/health/live", get(health::live))
        .route("/health/ready", get(health::ready))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
