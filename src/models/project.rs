//! Project records owned by the record store; this service only reads them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Status label counted as "active" in dashboard aggregates.
///
/// Project status is an open label set maintained by the back office, so it
/// stays a plain string rather than a closed enum.
pub const STATUS_ACTIVE: &str = "active";

/// Status label counted as "completed" in project analytics.
pub const STATUS_COMPLETED: &str = "completed";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub status: String,
    pub project_type: String,
    pub revenue: Option<f64>,
    pub created_at: DateTime<Utc>,
}
