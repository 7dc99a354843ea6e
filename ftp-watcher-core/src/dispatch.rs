use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::admission::{AdmissionController, DispatchSummary};
use crate::contract::{FileCreatedEvent, TransferClient};
use crate::retry::RetryPolicy;

/// Turns file-created events into admitted upload jobs.
///
/// `dispatch` returns only once the job is registered, so a full job set
/// blocks the caller (and through a bounded channel, the watcher thread)
/// instead of building an unbounded backlog.
pub struct WatchDispatcher<C: ?Sized> {
    policy: RetryPolicy<C>,
    admission: AdmissionController,
}

impl<C> WatchDispatcher<C>
where
    C: TransferClient + ?Sized + 'static,
{
    pub fn new(policy: RetryPolicy<C>) -> Self {
        Self {
            policy,
            admission: AdmissionController::new(),
        }
    }

    pub fn in_flight(&self) -> usize {
        self.admission.in_flight()
    }

    pub async fn dispatch(&mut self, event: FileCreatedEvent) {
        let capacity = self.policy.settings().current().max_connections;
        debug!(
            file = %event.full_path().display(),
            capacity,
            in_flight = self.admission.in_flight(),
            "Admitting upload job"
        );
        let job = self.policy.clone().run(event);
        self.admission.admit(capacity, job).await;
    }

    /// Dispatches events until the sender side closes, then waits for every
    /// job still running.
    pub async fn run(mut self, mut events: mpsc::Receiver<FileCreatedEvent>) -> DispatchSummary {
        info!("Dispatcher started");
        while let Some(event) = events.recv().await {
            self.dispatch(event).await;
        }
        info!(
            in_flight = self.admission.in_flight(),
            "Event source closed; waiting for running uploads"
        );
        let summary = self.admission.drain().await;
        info!(
            succeeded = summary.succeeded,
            abandoned = summary.abandoned,
            exhausted = summary.exhausted,
            crashed = summary.crashed,
            "Dispatcher finished"
        );
        summary
    }
}
