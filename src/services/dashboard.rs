//! Dashboard aggregation over the record store.
//!
//! The aggregator keeps an in-memory snapshot of business metrics and
//! refreshes it wholesale, either on demand or when a subscribed collection
//! reports a change. Fetch failures degrade to stale data; they are logged
//! and never surfaced to the caller.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::errors::AppError;
use crate::models::project::{self, Project};
use crate::models::transaction::Transaction;
use crate::store::{Collection, RecordStore};

/// How many transactions the recent slice holds.
pub const RECENT_TRANSACTIONS_LIMIT: i64 = 10;

/// How many of those the activity feed shows.
pub const RECENT_ACTIVITY_LEN: usize = 4;

/// Derived counts and sums recomputed from the raw fetched records on every
/// applied refresh. Always a pure function of the latest fetched sets.
#[derive(Debug, Clone, Serialize, Default)]
pub struct DashboardSummary {
    pub active_project_count: u64,
    /// Sum over the recent-transaction slice. Intentionally NOT the
    /// completed set: the displayed total has always been driven by the
    /// 10-item slice, and product wants it kept that way until reviewed.
    pub total_revenue: f64,
    /// Sum over all completed-transaction amounts, computed independently
    /// of `total_revenue` and not shown on the overview.
    pub completed_revenue: f64,
    /// Project count per category label, first-seen order.
    pub counts_by_category: IndexMap<String, u64>,
    pub recent_activity: Vec<Transaction>,
}

impl DashboardSummary {
    /// Recompute the summary wholesale from the latest fetched sets.
    pub fn compute(
        projects: &[Project],
        recent_transactions: &[Transaction],
        completed_amounts: &[f64],
    ) -> Self {
        let active_project_count = projects
            .iter()
            .filter(|p| p.status == project::STATUS_ACTIVE)
            .count() as u64;

        let total_revenue = recent_transactions
            .iter()
            .map(|t| t.amount.unwrap_or(0.0))
            .sum();

        let completed_revenue = completed_amounts.iter().sum();

        let mut counts_by_category: IndexMap<String, u64> = IndexMap::new();
        for p in projects {
            *counts_by_category.entry(p.project_type.clone()).or_insert(0) += 1;
        }

        let recent_activity = recent_transactions
            .iter()
            .take(RECENT_ACTIVITY_LEN)
            .cloned()
            .collect();

        Self {
            active_project_count,
            total_revenue,
            completed_revenue,
            counts_by_category,
            recent_activity,
        }
    }
}

/// The aggregator's full view: raw slices, derived summary, and fetch state.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub projects: Vec<Project>,
    pub recent_transactions: Vec<Transaction>,
    pub completed_amounts: Vec<f64>,
    pub summary: DashboardSummary,
    pub loading: bool,
    pub last_refreshed_at: Option<DateTime<Utc>>,
}

impl Default for DashboardSnapshot {
    fn default() -> Self {
        Self {
            projects: Vec::new(),
            recent_transactions: Vec::new(),
            completed_amounts: Vec::new(),
            summary: DashboardSummary::default(),
            // The view starts in a loading state until the first fetch lands.
            loading: true,
            last_refreshed_at: None,
        }
    }
}

struct AggregatorState {
    snapshot: DashboardSnapshot,
    /// Sequence number of the most recently applied refresh. Responses from
    /// older refreshes are discarded rather than overwriting newer state.
    applied_seq: u64,
}

/// Auto-refreshing view of business metrics sourced from the record store.
///
/// Construct with an injected store handle, then drive the lifecycle
/// explicitly: [`start`](Self::start) performs the initial fetch and
/// subscribes to change notifications, [`stop`](Self::stop) tears the
/// subscriptions down. `stop` is idempotent and safe from any point in the
/// lifecycle, including before the first fetch completes.
pub struct DashboardAggregator {
    store: Arc<dyn RecordStore>,
    state: RwLock<AggregatorState>,
    next_seq: AtomicU64,
    started: AtomicBool,
    stopped: AtomicBool,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl DashboardAggregator {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            state: RwLock::new(AggregatorState {
                snapshot: DashboardSnapshot::default(),
                applied_seq: 0,
            }),
            next_seq: AtomicU64::new(0),
            started: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Current snapshot, cloned out of the aggregator.
    pub fn snapshot(&self) -> DashboardSnapshot {
        self.state.read().unwrap().snapshot.clone()
    }

    /// Fetch all three slices and apply whatever succeeded.
    ///
    /// A failed retrieval leaves its slice at the previous value; the other
    /// results still apply. The loading flag clears on completion either
    /// way, and errors never propagate to the caller.
    pub async fn refresh(&self) {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;

        self.state.write().unwrap().snapshot.loading = true;

        let (projects, transactions, completed) = tokio::join!(
            self.store.fetch_projects(),
            self.store.fetch_recent_transactions(RECENT_TRANSACTIONS_LIMIT),
            self.store.fetch_completed_transaction_amounts(),
        );

        let mut state = self.state.write().unwrap();
        if seq <= state.applied_seq {
            tracing::debug!(seq, applied = state.applied_seq, "Discarding stale refresh");
            state.snapshot.loading = false;
            return;
        }
        state.applied_seq = seq;

        match projects {
            Ok(rows) => state.snapshot.projects = rows,
            Err(e) => tracing::warn!(error = %e, "Failed to fetch projects; keeping previous slice"),
        }
        match transactions {
            Ok(rows) => state.snapshot.recent_transactions = rows,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch transactions; keeping previous slice")
            }
        }
        match completed {
            Ok(amounts) => state.snapshot.completed_amounts = amounts,
            Err(e) => tracing::warn!(
                error = %e,
                "Failed to fetch completed amounts; keeping previous slice"
            ),
        }

        let summary = DashboardSummary::compute(
            &state.snapshot.projects,
            &state.snapshot.recent_transactions,
            &state.snapshot.completed_amounts,
        );
        state.snapshot.summary = summary;
        state.snapshot.loading = false;
        state.snapshot.last_refreshed_at = Some(Utc::now());
    }

    /// Perform the initial fetch and subscribe to project and transaction
    /// change notifications. Each notification triggers a full refresh; no
    /// incremental patching.
    pub async fn start(self: Arc<Self>) {
        if self.stopped.load(Ordering::SeqCst) {
            return;
        }
        if self.started.swap(true, Ordering::SeqCst) {
            tracing::warn!("Dashboard aggregator already started");
            return;
        }

        self.refresh().await;

        let mut tasks = self.tasks.lock().unwrap();
        for collection in [Collection::Projects, Collection::Transactions] {
            let aggregator = Arc::clone(&self);
            let mut rx = self.store.subscribe(collection);
            tasks.push(tokio::spawn(async move {
                loop {
                    match rx.recv().await {
                        Ok(event) => {
                            if aggregator.stopped.load(Ordering::SeqCst) {
                                break;
                            }
                            tracing::debug!(
                                collection = event.collection.as_str(),
                                op = ?event.op,
                                "Change notification; refetching"
                            );
                            aggregator.refresh().await;
                        }
                        // A lagged feed only coalesces notifications; one
                        // refresh catches the state up.
                        Err(RecvError::Lagged(skipped)) => {
                            if aggregator.stopped.load(Ordering::SeqCst) {
                                break;
                            }
                            tracing::debug!(skipped, "Change feed lagged; refetching");
                            aggregator.refresh().await;
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            }));
        }
        tracing::info!("Dashboard aggregator started");
    }

    /// Release both subscriptions. Safe to call multiple times and from any
    /// point in the lifetime; no notification-triggered refresh runs after
    /// the first call returns.
    pub fn stop(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        for handle in self.tasks.lock().unwrap().drain(..) {
            handle.abort();
        }
        tracing::info!("Dashboard aggregator stopped");
    }
}

impl Drop for DashboardAggregator {
    fn drop(&mut self) {
        self.stop();
    }
}

/// On-demand analytics over the full project set.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectStats {
    pub total_projects: u64,
    pub active_projects: u64,
    pub completed_projects: u64,
    /// Sum of project revenue figures, missing as zero.
    pub total_revenue: f64,
    pub projects_by_type: IndexMap<String, u64>,
    /// Revenue grouped by "Mon YYYY" label of the creation date,
    /// first-seen order.
    pub monthly_revenue: IndexMap<String, f64>,
}

impl ProjectStats {
    pub fn compute(projects: &[Project]) -> Self {
        let mut projects_by_type: IndexMap<String, u64> = IndexMap::new();
        let mut monthly_revenue: IndexMap<String, f64> = IndexMap::new();
        let mut active = 0u64;
        let mut completed = 0u64;
        let mut total_revenue = 0.0;

        for p in projects {
            if p.status == project::STATUS_ACTIVE {
                active += 1;
            } else if p.status == project::STATUS_COMPLETED {
                completed += 1;
            }
            total_revenue += p.revenue.unwrap_or(0.0);
            *projects_by_type.entry(p.project_type.clone()).or_insert(0) += 1;
            let month = p.created_at.format("%b %Y").to_string();
            *monthly_revenue.entry(month).or_insert(0.0) += p.revenue.unwrap_or(0.0);
        }

        Self {
            total_projects: projects.len() as u64,
            active_projects: active,
            completed_projects: completed,
            total_revenue,
            projects_by_type,
            monthly_revenue,
        }
    }
}

/// Fetch the full project set and compute analytics over it.
pub async fn project_stats(store: &dyn RecordStore) -> Result<ProjectStats, AppError> {
    let projects = store.fetch_projects().await?;
    Ok(ProjectStats::compute(&projects))
}
