use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::FixedOffset;
use serde::Serialize;
use tracing::{debug, error};

use super::aggregate::{aggregate_in, HistoryAggregate};
use crate::error::RepositoryError;
use crate::live::Subscription;
use crate::screening::{ScreeningRepository, ScreeningResult, ScreeningScope};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum FeedStatus {
    Waiting,
    Live,
    Stopped { reason: String },
}

#[derive(Debug)]
struct DashboardState {
    aggregate: Option<HistoryAggregate>,
    status: FeedStatus,
    refreshes: u64,
}

/// View-side chart state bound to a live screening query.
///
/// Each snapshot replaces the aggregate wholesale. When the query fails the last aggregate
/// stays readable and the status records why updates stopped.
#[derive(Debug, Clone)]
pub struct LiveDashboard {
    offset: FixedOffset,
    state: Arc<Mutex<DashboardState>>,
}

impl LiveDashboard {
    pub fn new(offset: FixedOffset) -> Self {
        Self {
            offset,
            state: Arc::new(Mutex::new(DashboardState {
                aggregate: None,
                status: FeedStatus::Waiting,
                refreshes: 0,
            })),
        }
    }

    /// Caller owns the returned handle; cancelling it freezes the dashboard as is.
    pub fn attach<R>(&self, repository: &R, scope: ScreeningScope) -> Subscription
    where
        R: ScreeningRepository + ?Sized,
    {
        let offset = self.offset;
        let on_snapshot_state = Arc::clone(&self.state);
        let on_error_state = Arc::clone(&self.state);

        repository.watch(
            scope,
            Box::new(move |results: &[ScreeningResult]| {
                let aggregate = aggregate_in(results, offset);
                let mut state = lock(&on_snapshot_state);
                state.aggregate = Some(aggregate);
                state.status = FeedStatus::Live;
                state.refreshes += 1;
                debug!(
                    results = results.len(),
                    refreshes = state.refreshes,
                    "dashboard aggregate refreshed"
                );
            }),
            Box::new(move |err: RepositoryError| {
                error!(error = %err, "screening live query stopped");
                lock(&on_error_state).status = FeedStatus::Stopped {
                    reason: err.to_string(),
                };
            }),
        )
    }

    pub fn aggregate(&self) -> Option<HistoryAggregate> {
        lock(&self.state).aggregate.clone()
    }

    pub fn status(&self) -> FeedStatus {
        lock(&self.state).status.clone()
    }

    pub fn refreshes(&self) -> u64 {
        lock(&self.state).refreshes
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
