//! In-process record store used by tests and the offline demo path.
//!
//! Mutations emit the same change events the PostgreSQL triggers would, so
//! subscription-driven behavior can be exercised without a database.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::project::Project;
use crate::models::service_request::{CreateServiceRequest, ServiceRequest, ServiceRequestStatus};
use crate::models::transaction::{self, Transaction};
use crate::store::{ChangeEvent, ChangeOp, Collection, RecordStore};

const FEED_CAPACITY: usize = 64;

#[derive(Default)]
struct Inner {
    projects: Vec<Project>,
    transactions: Vec<Transaction>,
    service_requests: HashMap<Uuid, ServiceRequest>,
}

pub struct MemoryRecordStore {
    inner: Mutex<Inner>,
    feeds: HashMap<Collection, broadcast::Sender<ChangeEvent>>,
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        let mut feeds = HashMap::new();
        for collection in [
            Collection::Projects,
            Collection::Transactions,
            Collection::ServiceRequests,
        ] {
            let (tx, _) = broadcast::channel(FEED_CAPACITY);
            feeds.insert(collection, tx);
        }
        Self {
            inner: Mutex::new(Inner::default()),
            feeds,
        }
    }

    /// Insert a project row, emitting an insert notification.
    pub fn insert_project(&self, project: Project) {
        self.inner.lock().unwrap().projects.push(project);
        self.emit(Collection::Projects, ChangeOp::Insert);
    }

    /// Insert a transaction row, emitting an insert notification.
    pub fn insert_transaction(&self, tx: Transaction) {
        self.inner.lock().unwrap().transactions.push(tx);
        self.emit(Collection::Transactions, ChangeOp::Insert);
    }

    fn emit(&self, collection: Collection, op: ChangeOp) {
        // No receivers is fine; nobody is subscribed yet.
        let _ = self.feeds[&collection].send(ChangeEvent { collection, op });
    }
}

#[async_trait::async_trait]
impl RecordStore for MemoryRecordStore {
    async fn fetch_projects(&self) -> Result<Vec<Project>, AppError> {
        let mut projects = self.inner.lock().unwrap().projects.clone();
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(projects)
    }

    async fn fetch_recent_transactions(&self, limit: i64) -> Result<Vec<Transaction>, AppError> {
        let mut transactions = self.inner.lock().unwrap().transactions.clone();
        transactions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        transactions.truncate(limit.max(0) as usize);
        Ok(transactions)
    }

    async fn fetch_completed_transaction_amounts(&self) -> Result<Vec<f64>, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .transactions
            .iter()
            .filter(|t| t.status == transaction::STATUS_COMPLETED)
            .map(|t| t.amount.unwrap_or(0.0))
            .collect())
    }

    async fn insert_service_request(
        &self,
        input: &CreateServiceRequest,
    ) -> Result<ServiceRequest, AppError> {
        let request = ServiceRequest {
            id: Uuid::new_v4(),
            client_name: input.client_name.clone(),
            client_email: input.client_email.clone(),
            client_phone: input.client_phone.clone(),
            company: input.company.clone(),
            website: input.website.clone(),
            project_type: input.project_type.clone(),
            plan: input.plan.clone(),
            timeline: input.timeline.clone(),
            description: input.description.clone(),
            status: ServiceRequestStatus::PendingConfirmation,
            created_at: Utc::now(),
            email_sent_at: None,
            confirmed_at: None,
        };
        self.inner
            .lock()
            .unwrap()
            .service_requests
            .insert(request.id, request.clone());
        self.emit(Collection::ServiceRequests, ChangeOp::Insert);
        Ok(request)
    }

    async fn update_service_request_status(
        &self,
        id: Uuid,
        status: ServiceRequestStatus,
    ) -> Result<ServiceRequest, AppError> {
        let updated = {
            let mut inner = self.inner.lock().unwrap();
            let request = inner
                .service_requests
                .get_mut(&id)
                .ok_or_else(|| AppError::NotFound("Service request not found".to_string()))?;
            request.status = status;
            match status {
                ServiceRequestStatus::EmailSent => request.email_sent_at = Some(Utc::now()),
                ServiceRequestStatus::Confirmed => request.confirmed_at = Some(Utc::now()),
                ServiceRequestStatus::PendingConfirmation => {}
            }
            request.clone()
        };
        self.emit(Collection::ServiceRequests, ChangeOp::Update);
        Ok(updated)
    }

    async fn fetch_service_request(&self, id: Uuid) -> Result<ServiceRequest, AppError> {
        self.inner
            .lock()
            .unwrap()
            .service_requests
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Service request not found".to_string()))
    }

    fn subscribe(&self, collection: Collection) -> broadcast::Receiver<ChangeEvent> {
        self.feeds[&collection].subscribe()
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::project::STATUS_ACTIVE;
    use chrono::Duration;

    fn project(name: &str, offset_secs: i64) -> Project {
        Project {
            id: Uuid::new_v4(),
            name: name.to_string(),
            status: STATUS_ACTIVE.to_string(),
            project_type: "Web Design".to_string(),
            revenue: Some(1000.0),
            created_at: Utc::now() - Duration::seconds(offset_secs),
        }
    }

    fn tx(amount: Option<f64>, status: &str, offset_secs: i64) -> Transaction {
        Transaction {
            id: Uuid::new_v4(),
            amount,
            project_id: None,
            tx_type: "deposit".to_string(),
            status: status.to_string(),
            created_at: Utc::now() - Duration::seconds(offset_secs),
        }
    }

    #[tokio::test]
    async fn projects_come_back_newest_first() {
        let store = MemoryRecordStore::new();
        store.insert_project(project("older", 60));
        store.insert_project(project("newer", 0));

        let projects = store.fetch_projects().await.unwrap();
        assert_eq!(projects[0].name, "newer");
        assert_eq!(projects[1].name, "older");
    }

    #[tokio::test]
    async fn recent_transactions_respect_limit() {
        let store = MemoryRecordStore::new();
        for i in 0..15 {
            store.insert_transaction(tx(Some(10.0), "completed", i));
        }
        let recent = store.fetch_recent_transactions(10).await.unwrap();
        assert_eq!(recent.len(), 10);
    }

    #[tokio::test]
    async fn completed_amounts_filter_and_default() {
        let store = MemoryRecordStore::new();
        store.insert_transaction(tx(Some(100.0), "completed", 0));
        store.insert_transaction(tx(None, "completed", 1));
        store.insert_transaction(tx(Some(50.0), "pending", 2));

        let amounts = store.fetch_completed_transaction_amounts().await.unwrap();
        assert_eq!(amounts.len(), 2);
        assert_eq!(amounts.iter().sum::<f64>(), 100.0);
    }

    #[tokio::test]
    async fn insert_emits_change_event() {
        let store = MemoryRecordStore::new();
        let mut rx = store.subscribe(Collection::Projects);
        store.insert_project(project("p", 0));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.collection, Collection::Projects);
        assert_eq!(event.op, ChangeOp::Insert);
    }

    #[tokio::test]
    async fn status_update_stamps_timestamps() {
        let store = MemoryRecordStore::new();
        let input = CreateServiceRequest {
            client_name: "A".to_string(),
            client_email: "a@example.com".to_string(),
            client_phone: None,
            company: None,
            website: None,
            project_type: None,
            plan: "basic".to_string(),
            timeline: None,
            description: None,
        };
        let request = store.insert_service_request(&input).await.unwrap();
        assert!(request.email_sent_at.is_none());

        let sent = store
            .update_service_request_status(request.id, ServiceRequestStatus::EmailSent)
            .await
            .unwrap();
        assert!(sent.email_sent_at.is_some());
        assert!(sent.confirmed_at.is_none());

        let confirmed = store
            .update_service_request_status(request.id, ServiceRequestStatus::Confirmed)
            .await
            .unwrap();
        assert!(confirmed.confirmed_at.is_some());
    }

    #[tokio::test]
    async fn unknown_service_request_is_not_found() {
        let store = MemoryRecordStore::new();
        let err = store.fetch_service_request(Uuid::new_v4()).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
