use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use tracing::{debug, info};

use crate::contract::Credentials;

/// Fail cap used when the settings do not name one.
pub const DEFAULT_MAX_FAILS: u32 = 3;

/// Runtime settings of the uploader.
///
/// Field names on the wire are the historical setting keys
/// (`MaxNumberOfFtpConnections`, `FtpServer`, ...).
#[derive(Clone, Deserialize)]
pub struct UploaderSettings {
    #[serde(rename = "MaxNumberOfFtpConnections")]
    pub max_connections: usize,
    #[serde(rename = "MonitorFolder")]
    pub monitor_folder: PathBuf,
    #[serde(rename = "MaxNumberOfFtpFailsBeforeIgnoringFile", default = "default_max_fails")]
    pub max_fails: u32,
    #[serde(rename = "FtpUser", default)]
    pub ftp_user: String,
    #[serde(rename = "FtpPassword", default)]
    pub ftp_password: String,
    #[serde(rename = "MaxNumberOfTriesToReadTheFiles")]
    pub max_read_polls: u32,
    #[serde(rename = "WaitMinutesBetweenTryingToReadTheFile")]
    pub wait_minutes_between_reads: u64,
    #[serde(rename = "ShouldUseYearAsFtpPath", default)]
    pub use_year_path: bool,
    #[serde(rename = "ShouldUseMonthAsFtpPath", default)]
    pub use_month_path: bool,
    #[serde(rename = "ShouldUseDayAsFtpPath", default)]
    pub use_day_path: bool,
    #[serde(rename = "FtpServer")]
    pub ftp_server: String,
}

fn default_max_fails() -> u32 {
    DEFAULT_MAX_FAILS
}

impl UploaderSettings {
    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.ftp_user, &self.ftp_password)
    }

    /// Pause between two readiness polls.
    pub fn read_poll_interval(&self) -> Duration {
        Duration::from_secs(self.wait_minutes_between_reads.saturating_mul(60))
    }

    /// Remote directory that files created on `date` are uploaded to.
    ///
    /// `FtpServer` followed by the enabled `year/month/day` segments, e.g.
    /// `ftp://server/2024/3/`. Segments are not zero padded.
    pub fn destination_root(&self, date: NaiveDate) -> String {
        let mut root = self.ftp_server.clone();
        if !root.ends_with('/') {
            root.push('/');
        }
        if self.use_year_path {
            root.push_str(&format!("{}/", date.year()));
        }
        if self.use_month_path {
            root.push_str(&format!("{}/", date.month()));
        }
        if self.use_day_path {
            root.push_str(&format!("{}/", date.day()));
        }
        root
    }

    pub fn trace_loaded(&self) {
        info!(
            monitor_folder = %self.monitor_folder.display(),
            ftp_server = %self.ftp_server,
            max_connections = self.max_connections,
            max_fails = self.max_fails,
            "Loaded uploader settings"
        );
        debug!(settings = ?self, "Uploader settings (full debug)");
    }
}

impl fmt::Debug for UploaderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploaderSettings")
            .field("max_connections", &self.max_connections)
            .field("monitor_folder", &self.monitor_folder)
            .field("max_fails", &self.max_fails)
            .field("credentials", &self.credentials())
            .field("max_read_polls", &self.max_read_polls)
            .field("wait_minutes_between_reads", &self.wait_minutes_between_reads)
            .field("use_year_path", &self.use_year_path)
            .field("use_month_path", &self.use_month_path)
            .field("use_day_path", &self.use_day_path)
            .field("ftp_server", &self.ftp_server)
            .finish()
    }
}

/// Read-only settings provider.
///
/// Consulted again before every admission and every upload attempt, so an
/// implementation backed by a file picks up edits without a restart.
pub trait SettingsSource: Send + Sync {
    fn current(&self) -> UploaderSettings;
}

/// Fixed settings, never reloaded.
impl SettingsSource for UploaderSettings {
    fn current(&self) -> UploaderSettings {
        self.clone()
    }
}
