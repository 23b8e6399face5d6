//! Refresh coordination.
//!
//! Every refresh is issued a token from a monotonic counter before it starts
//! fetching. When it finishes, its summaries replace the current snapshot only
//! if its token is newer than the one already applied; a slow refresh that
//! completes after a newer one is discarded. Predictions keep reading the
//! last applied snapshot while a refresh is in flight or after one fails.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::time::interval;
use tracing::{error, info, warn};

use crate::calculate::aggregate;
use crate::fetch::{FetchError, ShiftSource};
use crate::models::ShiftSummary;

/// Errors that can occur during a refresh.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),
}

/// Whether the last refresh reached the upstream feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Connectivity {
    /// No refresh has completed yet
    #[default]
    Pending,
    Live,
    Offline,
}

impl std::fmt::Display for Connectivity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Connectivity::Pending => write!(f, "Syncing"),
            Connectivity::Live => write!(f, "Live Feed Active"),
            Connectivity::Offline => write!(f, "Offline"),
        }
    }
}

/// One applied set of shift summaries.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub token: u64,
    pub fetched_at: DateTime<Utc>,
    pub shifts: Arc<Vec<ShiftSummary>>,
}

/// Externally visible refresh bookkeeping.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefreshState {
    pub connectivity: Connectivity,
    /// Token of the snapshot currently in use (0 = none)
    pub applied_token: u64,
    pub last_success: Option<DateTime<Utc>>,
    pub last_failure: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    /// Completions thrown away because a newer refresh had already applied
    pub discarded: u64,
    pub shift_count: usize,
}

/// Result of a refresh that reached the upstream feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum RefreshOutcome {
    Applied { token: u64, shifts: usize },
    Discarded { token: u64, current: u64 },
}

#[derive(Debug, Default)]
struct Inner {
    snapshot: Option<Arc<Snapshot>>,
    state: RefreshState,
}

/// Owns the current shift summaries and decides which refresh wins.
#[derive(Debug, Default)]
pub struct RefreshCoordinator {
    next_token: AtomicU64,
    inner: RwLock<Inner>,
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the token for a refresh that is about to start.
    pub fn issue(&self) -> u64 {
        self.next_token.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Install `shifts` if `token` is newer than the applied snapshot.
    pub async fn apply(&self, token: u64, shifts: Vec<ShiftSummary>) -> RefreshOutcome {
        let mut inner = self.inner.write().await;
        let current = inner.state.applied_token;
        if token <= current {
            inner.state.discarded += 1;
            warn!(token, current, "Discarding stale refresh result");
            return RefreshOutcome::Discarded { token, current };
        }

        let now = Utc::now();
        let count = shifts.len();
        inner.snapshot = Some(Arc::new(Snapshot {
            token,
            fetched_at: now,
            shifts: Arc::new(shifts),
        }));
        inner.state.applied_token = token;
        inner.state.connectivity = Connectivity::Live;
        inner.state.last_success = Some(now);
        inner.state.last_error = None;
        inner.state.shift_count = count;

        info!(token, shifts = count, "Applied refresh");
        RefreshOutcome::Applied {
            token,
            shifts: count,
        }
    }

    /// Record a failed refresh. Ignored if a newer refresh already applied.
    pub async fn fail(&self, token: u64, err: &FetchError) {
        let mut inner = self.inner.write().await;
        if token <= inner.state.applied_token {
            return;
        }
        inner.state.connectivity = Connectivity::Offline;
        inner.state.last_failure = Some(Utc::now());
        inner.state.last_error = Some(err.to_string());
    }

    /// Fetch, aggregate and apply in one go.
    pub async fn refresh(&self, source: &dyn ShiftSource) -> Result<RefreshOutcome, SyncError> {
        let token = self.issue();
        info!(token, source = source.name(), "Starting refresh");

        match source.fetch_records().await {
            Ok(records) => {
                let shifts = aggregate(&records);
                Ok(self.apply(token, shifts).await)
            }
            Err(e) => {
                self.fail(token, &e).await;
                Err(e.into())
            }
        }
    }

    /// Refresh every `period` until the task is dropped.
    pub async fn run_periodic(self: Arc<Self>, source: Arc<dyn ShiftSource>, period: Duration) {
        let mut ticker = interval(period);

        info!("Starting periodic refresh every {:?}", period);

        loop {
            ticker.tick().await;

            match self.refresh(source.as_ref()).await {
                Ok(RefreshOutcome::Applied { token, shifts }) => {
                    info!("Periodic refresh {} applied: {} shifts", token, shifts);
                }
                Ok(RefreshOutcome::Discarded { .. }) => {}
                Err(e) => {
                    error!("Periodic refresh failed: {}", e);
                }
            }
        }
    }

    /// The snapshot currently in use.
    pub async fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.inner.read().await.snapshot.clone()
    }

    /// Current shift summaries, empty before the first successful refresh.
    pub async fn shifts(&self) -> Arc<Vec<ShiftSummary>> {
        self.snapshot()
            .await
            .map(|s| s.shifts.clone())
            .unwrap_or_default()
    }

    pub async fn state(&self) -> RefreshState {
        self.inner.read().await.state.clone()
    }
}
