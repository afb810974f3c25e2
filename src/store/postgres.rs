//! PostgreSQL record store backed by sqlx.
//!
//! Change notifications ride on `LISTEN`/`NOTIFY`: row-level triggers (see
//! `migrations/0002_change_notifications.sql`) call `pg_notify` on the
//! per-collection channels, and a background listener task forwards each
//! notification into a broadcast feed.

use std::collections::HashMap;

use sqlx::postgres::PgListener;
use sqlx::PgPool;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::project::Project;
use crate::models::service_request::{CreateServiceRequest, ServiceRequest, ServiceRequestStatus};
use crate::models::transaction::Transaction;
use crate::store::{ChangeEvent, ChangeOp, Collection, RecordStore};

/// Capacity of each per-collection change feed. Subscribers refetch
/// wholesale, so a lagged receiver only coalesces notifications.
const FEED_CAPACITY: usize = 64;

pub struct PgRecordStore {
    pool: PgPool,
    feeds: HashMap<Collection, broadcast::Sender<ChangeEvent>>,
    listener: JoinHandle<()>,
}

impl PgRecordStore {
    /// Wrap a connection pool and start the change-notification listener.
    pub fn connect(pool: PgPool) -> Self {
        let mut feeds = HashMap::new();
        for collection in [
            Collection::Projects,
            Collection::Transactions,
            Collection::ServiceRequests,
        ] {
            let (tx, _) = broadcast::channel(FEED_CAPACITY);
            feeds.insert(collection, tx);
        }

        let listener = tokio::spawn(run_listener(pool.clone(), feeds.clone()));

        Self {
            pool,
            feeds,
            listener,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl Drop for PgRecordStore {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

/// Forward `pg_notify` notifications into the broadcast feeds.
///
/// Setup failures are logged and leave the feeds silent; `PgListener`
/// reconnects on its own after steady-state connection errors.
async fn run_listener(pool: PgPool, feeds: HashMap<Collection, broadcast::Sender<ChangeEvent>>) {
    let mut listener = match PgListener::connect_with(&pool).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to open change-notification listener");
            return;
        }
    };

    let channels: Vec<&str> = feeds.keys().map(|c| c.channel()).collect();
    if let Err(e) = listener.listen_all(channels).await {
        tracing::warn!(error = %e, "Failed to listen on change-notification channels");
        return;
    }

    loop {
        match listener.recv().await {
            Ok(notification) => {
                let Some(collection) = Collection::from_channel(notification.channel()) else {
                    continue;
                };
                let event = ChangeEvent {
                    collection,
                    op: ChangeOp::from_payload(notification.payload()),
                };
                if let Some(feed) = feeds.get(&collection) {
                    // No receivers is fine; nobody is subscribed yet.
                    let _ = feed.send(event);
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Change-notification stream error");
            }
        }
    }
}

/// Distinguish rows that fail to decode from transport-level errors.
fn map_fetch_err(e: sqlx::Error) -> AppError {
    match e {
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) | sqlx::Error::TypeNotFound { .. } => {
            AppError::MalformedData(e.to_string())
        }
        other => AppError::Database(other),
    }
}

#[async_trait::async_trait]
impl RecordStore for PgRecordStore {
    async fn fetch_projects(&self) -> Result<Vec<Project>, AppError> {
        sqlx::query_as::<_, Project>(
            "SELECT id, name, status, project_type, revenue, created_at
             FROM projects
             ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_fetch_err)
    }

    async fn fetch_recent_transactions(&self, limit: i64) -> Result<Vec<Transaction>, AppError> {
        sqlx::query_as::<_, Transaction>(
            "SELECT id, amount, project_id, tx_type, status, created_at
             FROM transactions
             ORDER BY created_at DESC
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_fetch_err)
    }

    async fn fetch_completed_transaction_amounts(&self) -> Result<Vec<f64>, AppError> {
        sqlx::query_scalar::<_, f64>(
            "SELECT COALESCE(amount, 0) FROM transactions WHERE status = 'completed'",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_fetch_err)
    }

    async fn insert_service_request(
        &self,
        input: &CreateServiceRequest,
    ) -> Result<ServiceRequest, AppError> {
        sqlx::query_as::<_, ServiceRequest>(
            r#"
            INSERT INTO service_requests (client_name, client_email, client_phone, company,
                website, project_type, plan, timeline, description, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'pending_confirmation')
            RETURNING *
            "#,
        )
        .bind(&input.client_name)
        .bind(&input.client_email)
        .bind(&input.client_phone)
        .bind(&input.company)
        .bind(&input.website)
        .bind(&input.project_type)
        .bind(&input.plan)
        .bind(&input.timeline)
        .bind(&input.description)
        .fetch_one(&self.pool)
        .await
        .map_err(map_fetch_err)
    }

    async fn update_service_request_status(
        &self,
        id: Uuid,
        status: ServiceRequestStatus,
    ) -> Result<ServiceRequest, AppError> {
        sqlx::query_as::<_, ServiceRequest>(
            r#"
            UPDATE service_requests SET
                status = $2,
                email_sent_at = CASE WHEN $2 = 'email_sent'::service_request_status
                                     THEN NOW() ELSE email_sent_at END,
                confirmed_at  = CASE WHEN $2 = 'confirmed'::service_request_status
                                     THEN NOW() ELSE confirmed_at END
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_fetch_err)?
        .ok_or_else(|| AppError::NotFound("Service request not found".to_string()))
    }

    async fn fetch_service_request(&self, id: Uuid) -> Result<ServiceRequest, AppError> {
        sqlx::query_as::<_, ServiceRequest>("SELECT * FROM service_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_fetch_err)?
            .ok_or_else(|| AppError::NotFound("Service request not found".to_string()))
    }

    fn subscribe(&self, collection: Collection) -> broadcast::Receiver<ChangeEvent> {
        self.feeds[&collection].subscribe()
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
