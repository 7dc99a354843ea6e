#![doc = "ftp-watcher-core: upload orchestration library for ftp-watcher."]

//! This crate contains the logic that turns "a file appeared in a folder" into
//! "the file is on the FTP server": admission control, the readiness gate,
//! the per-file retry loop and remote directory provisioning.
//!
//! The watcher, the settings file and the wire-level FTP client live in the
//! `ftp-watcher` binary crate; here they are only contracts
//! (see [`contract`] and [`config::SettingsSource`]).

pub mod admission;
pub mod attempt;
pub mod config;
pub mod contract;
pub mod destination;
pub mod dispatch;
pub mod provision;
pub mod readiness;
pub mod retry;
