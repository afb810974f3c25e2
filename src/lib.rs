pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;

use std::sync::Arc;

use crate::services::dashboard::DashboardAggregator;
use crate::store::RecordStore;

/// Shared application state passed to all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub aggregator: Arc<DashboardAggregator>,
    pub config: config::AppConfig,
}
