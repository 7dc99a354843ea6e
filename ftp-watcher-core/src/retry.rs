//! Per-file upload job: readiness gate, transfer, and retry with directory
//! provisioning between attempts.
//!
//! # States
//! - `Attempting`: wait for the file, then upload it to today's destination.
//! - `Succeeded`: the transfer went through (terminal).
//! - `Abandoned`: the file never became ready within the poll budget (terminal, silent).
//! - `Failed`: count the failure, pause, provision the destination directory,
//!   then go back to `Attempting` while the fail cap allows it.
//! - `FailsExhausted`: the fail cap was reached (terminal, logged).
//!
//! Settings are fetched from the [`SettingsSource`] on every iteration, so a
//! changed fail cap or poll budget applies to jobs that are already running.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tracing::{error, info, warn, Instrument};
use uuid::Uuid;

use crate::attempt::upload_once;
use crate::config::SettingsSource;
use crate::contract::{FileCreatedEvent, TransferClient};
use crate::provision::RemotePathProvisioner;
use crate::readiness::wait_until_ready;

/// Pause after a failed attempt, before provisioning and retrying.
pub const RETRY_BACKOFF: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    Succeeded { attempts: u32 },
    Abandoned,
    FailsExhausted { attempts: u32 },
}

fn local_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Everything an upload job needs, cloned into each spawned job.
pub struct RetryPolicy<C: ?Sized> {
    client: Arc<C>,
    settings: Arc<dyn SettingsSource>,
    backoff: Duration,
    today: fn() -> NaiveDate,
}

impl<C: ?Sized> Clone for RetryPolicy<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            settings: Arc::clone(&self.settings),
            backoff: self.backoff,
            today: self.today,
        }
    }
}

impl<C> RetryPolicy<C>
where
    C: TransferClient + ?Sized + 'static,
{
    pub fn new(client: Arc<C>, settings: Arc<dyn SettingsSource>) -> Self {
        Self {
            client,
            settings,
            backoff: RETRY_BACKOFF,
            today: local_today,
        }
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Replace the wall clock used to pick the dated destination directory.
    pub fn with_clock(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn settings(&self) -> &Arc<dyn SettingsSource> {
        &self.settings
    }

    /// Runs one file to a terminal state inside its own `upload_job` span.
    pub async fn run(self, event: FileCreatedEvent) -> UploadOutcome {
        let span = tracing::info_span!(
            "upload_job",
            job_id = %Uuid::new_v4(),
            file = %event.full_path().display()
        );
        self.run_attempts(&event).instrument(span).await
    }

    async fn run_attempts(&self, event: &FileCreatedEvent) -> UploadOutcome {
        let path = event.full_path();
        let mut fails: u32 = 0;

        loop {
            let settings = self.settings.current();
            if fails >= settings.max_fails {
                error!(
                    fails,
                    max_fails = settings.max_fails,
                    "[UPLOAD] Fail cap reached; file will not be uploaded"
                );
                return UploadOutcome::FailsExhausted { attempts: fails };
            }

            let destination_root = settings.destination_root((self.today)());
            let credentials = settings.credentials();

            if !wait_until_ready(
                &path,
                settings.read_poll_interval(),
                settings.max_read_polls,
            )
            .await
            {
                info!(
                    polls = settings.max_read_polls,
                    "[UPLOAD] File never became ready; abandoning"
                );
                return UploadOutcome::Abandoned;
            }

            match upload_once(self.client.as_ref(), &credentials, &destination_root, event).await
            {
                Ok(()) => {
                    info!(
                        destination = %destination_root,
                        attempts = fails + 1,
                        "[UPLOAD] File uploaded"
                    );
                    return UploadOutcome::Succeeded { attempts: fails + 1 };
                }
                Err(e) => {
                    fails += 1;
                    warn!(
                        destination = %destination_root,
                        fails,
                        error = %e,
                        "[UPLOAD] Attempt failed"
                    );
                    tokio::time::sleep(self.backoff).await;
                    RemotePathProvisioner::new(self.client.as_ref(), &credentials)
                        .ensure_directory_exists(&destination_root)
                        .await;
                }
            }
        }
    }
}
