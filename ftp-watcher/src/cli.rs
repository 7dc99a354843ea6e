//! This module implements the CLI of ftp-watcher: command parsing and the
//! async entrypoint that wires the watcher, the settings file and the FTP
//! client into the core dispatcher.
//!
//! All orchestration logic (admission, retries, provisioning) lives in the
//! [`ftp-watcher-core`] crate. This module is strictly CLI glue.
//!
//! ## How To Use
//! - Command line: `ftp-watcher watch --config ftp-watcher.yaml`.
//! - Programmatic/integration use: call [`run`] with a constructed [`Cli`].
//!
//! [`ftp-watcher-core`]: ../../ftp_watcher_core/

use crate::ftp::FtpClient;
use crate::load_config::{load_config, ConfigFile};
use crate::watch::watch_folder;
use anyhow::Result;
use clap::{Parser, Subcommand};
use ftp_watcher_core::config::SettingsSource;
use ftp_watcher_core::dispatch::WatchDispatcher;
use ftp_watcher_core::retry::RetryPolicy;
use std::path::PathBuf;
use std::sync::Arc;

pub const DEFAULT_CONFIG_PATH: &str = "ftp-watcher.yaml";

/// CLI for ftp-watcher: upload every new file in a folder to an FTP server.
#[derive(Parser)]
#[clap(
    name = "ftp-watcher",
    version,
    about = "Watch a folder and upload every new file to an FTP server"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Watch the configured folder and upload new files until interrupted
    Watch {
        /// Path to the YAML settings file
        #[clap(long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },
    /// Validate the settings file and print today's upload destination
    Check {
        /// Path to the YAML settings file
        #[clap(long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Watch { config } => watch(config).await,
        Commands::Check { config } => {
            let settings = load_config(&config)?;
            settings.trace_loaded();
            let today = chrono::Local::now().date_naive();
            println!("Configuration OK: {}", config.display());
            println!("Monitored folder: {}", settings.monitor_folder.display());
            println!("Upload destination: {}", settings.destination_root(today));
            Ok(())
        }
    }
}

async fn watch(config: PathBuf) -> Result<()> {
    let settings_file = Arc::new(ConfigFile::open(&config)?);
    let monitor_folder = settings_file.current().monitor_folder;
    tracing::info!(
        command = "watch",
        config = %settings_file.path().display(),
        "Starting uploader"
    );

    let (_watcher, events) = watch_folder(&monitor_folder)?;
    let policy = RetryPolicy::new(Arc::new(FtpClient::default()), settings_file);
    let dispatcher = WatchDispatcher::new(policy);

    tokio::select! {
        summary = dispatcher.run(events) => {
            tracing::warn!(?summary, "Watcher stopped; uploader exiting");
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            tracing::info!("Interrupted; uploader exiting");
        }
    }
    Ok(())
}
