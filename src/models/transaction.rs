//! Transaction records owned by the record store; this service only reads them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Status label selecting transactions for the completed-revenue total.
pub const STATUS_COMPLETED: &str = "completed";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Transaction {
    pub id: Uuid,
    /// Monetary amount; absent amounts count as zero in revenue sums.
    pub amount: Option<f64>,
    pub project_id: Option<Uuid>,
    /// "deposit" or another free-form label.
    pub tx_type: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}
