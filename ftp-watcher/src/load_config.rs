//! `load_config` module: loads the YAML settings file, injects credentials from the
//! environment, and validates the result into [`UploaderSettings`].
//!
//! # Responsibilities
//! - Parse the user-supplied YAML file (historical key names such as `FtpServer`)
//! - Override `FtpUser` / `FtpPassword` with `FTP_USER` / `FTP_PASSWORD` when set,
//!   so secrets can stay out of the file
//! - Reject settings the uploader cannot run with
//! - Provide [`ConfigFile`], a [`SettingsSource`] that re-reads the file whenever
//!   it changed on disk and keeps the last good settings when an edit is broken
//!
//! # Errors
//! All errors use `anyhow::Error` and are surfaced at the CLI boundary.

use anyhow::{Context, Result};
use ftp_watcher_core::config::{SettingsSource, UploaderSettings};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::SystemTime;
use tracing::{debug, error, warn};

pub const FTP_USER_ENV: &str = "FTP_USER";
pub const FTP_PASSWORD_ENV: &str = "FTP_PASSWORD";

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<UploaderSettings> {
    let path_ref = path.as_ref();
    debug!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let mut settings: UploaderSettings = match serde_yaml::from_str(&config_content) {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    if let Ok(user) = std::env::var(FTP_USER_ENV) {
        debug!("{FTP_USER_ENV} found in env; overriding FtpUser");
        settings.ftp_user = user;
    }
    if let Ok(password) = std::env::var(FTP_PASSWORD_ENV) {
        debug!("{FTP_PASSWORD_ENV} found in env; overriding FtpPassword");
        settings.ftp_password = password;
    }

    validate(&settings).with_context(|| format!("Invalid settings in {path_ref:?}"))?;
    Ok(settings)
}

fn validate(settings: &UploaderSettings) -> Result<()> {
    if settings.max_connections == 0 {
        anyhow::bail!("MaxNumberOfFtpConnections must be at least 1");
    }
    if settings.ftp_server.trim().is_empty() {
        anyhow::bail!("FtpServer must not be empty");
    }
    if settings.monitor_folder.as_os_str().is_empty() {
        anyhow::bail!("MonitorFolder must not be empty");
    }
    Ok(())
}

/// Modification time and length of the settings file; a change in either
/// triggers a reload.
type Stamp = Option<(SystemTime, u64)>;

fn stamp(path: &Path) -> Stamp {
    let meta = fs::metadata(path).ok()?;
    Some((meta.modified().ok()?, meta.len()))
}

struct Loaded {
    settings: UploaderSettings,
    /// Stamp of the last load attempt, successful or not.
    seen: Stamp,
}

/// Settings file that is re-read whenever it changed since the last request.
///
/// Requests that find the file unchanged are answered from memory, so the
/// dispatcher and running jobs can ask as often as they like. A broken edit
/// is reported once and the previous settings stay in effect until the file
/// changes again.
pub struct ConfigFile {
    path: PathBuf,
    loaded: RwLock<Loaded>,
}

impl ConfigFile {
    /// Loads the file once; fails if the initial load fails.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let seen = stamp(&path);
        let settings = load_config(&path)?;
        settings.trace_loaded();
        Ok(Self {
            path,
            loaded: RwLock::new(Loaded { settings, seen }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsSource for ConfigFile {
    fn current(&self) -> UploaderSettings {
        let now = stamp(&self.path);
        let mut loaded = match self.loaded.write() {
            Ok(loaded) => loaded,
            Err(poisoned) => poisoned.into_inner(),
        };
        if now == loaded.seen {
            return loaded.settings.clone();
        }
        loaded.seen = now;
        match load_config(&self.path) {
            Ok(settings) => {
                debug!(config_path = ?self.path, "Settings file changed; reloaded");
                loaded.settings = settings;
            }
            Err(e) => {
                warn!(error = %e, config_path = ?self.path, "Reload failed; keeping previous settings");
            }
        }
        loaded.settings.clone()
    }
}
