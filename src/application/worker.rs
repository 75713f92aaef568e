// Background planning jobs.
//
// A run is synchronous and CPU-bound, so each job goes to tokio's blocking
// pool. Callers get a `JobToken` back immediately and redeem it once with
// `PlanningWorker::completion`. A finished report is held until its token is
// redeemed or discarded.

use super::PlanningService;
use crate::domain::{PlanReport, PlanningRequest};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobToken(u64);

impl fmt::Display for JobToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job-{}", self.0)
    }
}

/// The single result delivered for a job.
#[derive(Debug)]
pub enum JobCompletion {
    Completed(PlanReport),
    Failed(String),
}

impl JobCompletion {
    pub fn report(&self) -> Option<&PlanReport> {
        match self {
            JobCompletion::Completed(report) => Some(report),
            JobCompletion::Failed(_) => None,
        }
    }
}

pub struct PlanningWorker {
    service: Arc<PlanningService>,
    next_id: AtomicU64,
    jobs: Mutex<HashMap<JobToken, JoinHandle<PlanReport>>>,
}

impl PlanningWorker {
    pub fn new(service: PlanningService) -> Self {
        Self {
            service: Arc::new(service),
            next_id: AtomicU64::new(1),
            jobs: Mutex::new(HashMap::new()),
        }
    }

    /// Starts a run in the background. Must be called inside a tokio runtime.
    ///
    /// The job stays registered until `completion` or `discard` is called with
    /// the returned token.
    pub fn submit(&self, request: PlanningRequest) -> JobToken {
        let token = JobToken(self.next_id.fetch_add(1, Ordering::Relaxed));
        let service = Arc::clone(&self.service);
        let handle = tokio::task::spawn_blocking(move || service.run(&request));
        self.jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(token, handle);
        debug!(%token, strategy = %self.service.strategy(), "planning job submitted");
        token
    }

    /// Waits for a job. Each token yields exactly one completion; unknown or
    /// already redeemed tokens yield `Failed`.
    pub async fn completion(&self, token: JobToken) -> JobCompletion {
        let handle = self
            .jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&token);
        let Some(handle) = handle else {
            return JobCompletion::Failed(format!("{} is unknown or was already redeemed", token));
        };
        match handle.await {
            Ok(report) => JobCompletion::Completed(report),
            Err(e) => {
                warn!(%token, error = %e, "planning job did not complete");
                let reason = if e.is_panic() {
                    "planning job panicked"
                } else {
                    "planning job was cancelled"
                };
                JobCompletion::Failed(format!("{}: {}", token, reason))
            }
        }
    }

    /// Forgets a job without waiting for it. A running job finishes in the
    /// background and its report is dropped. Returns false for unknown or
    /// already redeemed tokens.
    pub fn discard(&self, token: JobToken) -> bool {
        let removed = self
            .jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&token)
            .is_some();
        if removed {
            debug!(%token, "planning job discarded");
        }
        removed
    }

    /// Jobs submitted but not yet redeemed or discarded.
    pub fn pending(&self) -> usize {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}
