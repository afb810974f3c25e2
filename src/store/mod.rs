//! Record store boundary: typed queries, mutations, and change notifications.
//!
//! The rest of the service talks to the store through the [`RecordStore`]
//! trait so the backing implementation can be swapped (PostgreSQL in
//! production, in-memory for tests and offline demos). Row decoding happens
//! at this edge; a row that does not fit its typed record surfaces as
//! [`AppError::MalformedData`] instead of leaking dynamic shapes upward.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::project::Project;
use crate::models::service_request::{CreateServiceRequest, ServiceRequest, ServiceRequestStatus};
use crate::models::transaction::Transaction;

/// Named record collections consumed by this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Projects,
    Transactions,
    ServiceRequests,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Projects => "projects",
            Collection::Transactions => "transactions",
            Collection::ServiceRequests => "service_requests",
        }
    }

    /// Notification channel carrying this collection's change events.
    pub fn channel(&self) -> &'static str {
        match self {
            Collection::Projects => "projects_changes",
            Collection::Transactions => "transactions_changes",
            Collection::ServiceRequests => "service_requests_changes",
        }
    }

    /// Resolve a notification channel name back to its collection.
    pub fn from_channel(channel: &str) -> Option<Self> {
        match channel {
            "projects_changes" => Some(Collection::Projects),
            "transactions_changes" => Some(Collection::Transactions),
            "service_requests_changes" => Some(Collection::ServiceRequests),
            _ => None,
        }
    }
}

/// Row-level mutation kind reported by a change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOp {
    Insert,
    Update,
    Delete,
}

impl ChangeOp {
    /// Parse a notification payload; unknown payloads read as `Update`,
    /// since subscribers refetch wholesale either way.
    pub fn from_payload(payload: &str) -> Self {
        match payload {
            "insert" => ChangeOp::Insert,
            "update" => ChangeOp::Update,
            "delete" => ChangeOp::Delete,
            _ => ChangeOp::Update,
        }
    }
}

/// A change notification emitted when a row in a subscribed collection is
/// inserted, updated, or deleted. Carries no row payload.
#[derive(Debug, Clone, Copy)]
pub struct ChangeEvent {
    pub collection: Collection,
    pub op: ChangeOp,
}

/// The external record store as seen by this service.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All projects, newest first.
    async fn fetch_projects(&self) -> Result<Vec<Project>, AppError>;

    /// The most recent transactions, newest first.
    async fn fetch_recent_transactions(&self, limit: i64) -> Result<Vec<Transaction>, AppError>;

    /// Amounts of all transactions with status `"completed"`, missing
    /// amounts as zero.
    async fn fetch_completed_transaction_amounts(&self) -> Result<Vec<f64>, AppError>;

    /// Insert a service request with status `pending_confirmation`.
    async fn insert_service_request(
        &self,
        input: &CreateServiceRequest,
    ) -> Result<ServiceRequest, AppError>;

    /// Set a service request's status, stamping the matching transition
    /// timestamp (`email_sent_at` or `confirmed_at`).
    async fn update_service_request_status(
        &self,
        id: Uuid,
        status: ServiceRequestStatus,
    ) -> Result<ServiceRequest, AppError>;

    async fn fetch_service_request(&self, id: Uuid) -> Result<ServiceRequest, AppError>;

    /// Subscribe to change notifications for one collection.
    fn subscribe(&self, collection: Collection) -> broadcast::Receiver<ChangeEvent>;

    /// Connectivity probe for readiness checks.
    async fn ping(&self) -> Result<(), AppError>;
}
