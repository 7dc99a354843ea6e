//! Admission control for upload jobs.
//!
//! The controller owns the set of running jobs. Before a new job is spawned
//! it reaps everything that already finished; if the set is still full it
//! waits for any one job to complete. Waiters are not served in order.

use std::future::Future;

use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error};

use crate::retry::UploadOutcome;

/// Tally of finished jobs.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSummary {
    pub succeeded: usize,
    pub abandoned: usize,
    pub exhausted: usize,
    /// Jobs that panicked or were aborted.
    pub crashed: usize,
}

impl DispatchSummary {
    pub fn total(&self) -> usize {
        self.succeeded + self.abandoned + self.exhausted + self.crashed
    }

    fn record(&mut self, finished: Result<UploadOutcome, JoinError>) {
        match finished {
            Ok(UploadOutcome::Succeeded { .. }) => self.succeeded += 1,
            Ok(UploadOutcome::Abandoned) => self.abandoned += 1,
            Ok(UploadOutcome::FailsExhausted { .. }) => self.exhausted += 1,
            Err(e) => {
                error!(error = %e, "Upload job crashed");
                self.crashed += 1;
            }
        }
    }
}

#[derive(Default)]
pub struct AdmissionController {
    running: JoinSet<UploadOutcome>,
    summary: DispatchSummary,
}

impl AdmissionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of jobs admitted and not yet reaped.
    pub fn in_flight(&self) -> usize {
        self.running.len()
    }

    pub fn summary(&self) -> DispatchSummary {
        self.summary
    }

    /// Waits for a free slot (`capacity` of 0 counts as 1), then spawns `job`.
    pub async fn admit<F>(&mut self, capacity: usize, job: F)
    where
        F: Future<Output = UploadOutcome> + Send + 'static,
    {
        let capacity = capacity.max(1);
        self.reap_finished();
        while self.running.len() >= capacity {
            debug!(
                in_flight = self.running.len(),
                capacity, "All upload slots busy; waiting for a job to finish"
            );
            match self.running.join_next().await {
                Some(finished) => self.summary.record(finished),
                None => break,
            }
            self.reap_finished();
        }
        self.running.spawn(job);
    }

    /// Waits for every in-flight job and returns the final tally.
    pub async fn drain(&mut self) -> DispatchSummary {
        while let Some(finished) = self.running.join_next().await {
            self.summary.record(finished);
        }
        self.summary
    }

    fn reap_finished(&mut self) {
        while let Some(finished) = self.running.try_join_next() {
            self.summary.record(finished);
        }
    }
}
