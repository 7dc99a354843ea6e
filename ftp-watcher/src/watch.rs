//! Directory watcher: turns `notify` create events into [`FileCreatedEvent`]s
//! on a bounded channel.
//!
//! The watcher callback runs on notify's own thread and uses `blocking_send`,
//! so when the dispatcher stops taking events (all upload slots busy and the
//! channel full) the watcher thread waits too.

use std::path::Path;

use anyhow::{Context, Result};
use ftp_watcher_core::contract::FileCreatedEvent;
use notify::event::CreateKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Capacity of the channel between the watcher thread and the dispatcher.
pub const EVENT_BUFFER: usize = 16;

/// File-created events carried by one notify event. Folder creations and
/// every other kind of change are ignored.
pub fn created_files(event: &Event) -> Vec<FileCreatedEvent> {
    match event.kind {
        EventKind::Create(CreateKind::Folder) => Vec::new(),
        EventKind::Create(_) => event
            .paths
            .iter()
            .filter_map(|path| {
                let created = FileCreatedEvent::from_path(path);
                if created.is_none() {
                    warn!(path = %path.display(), "Created path has no UTF-8 file name; not uploading it");
                }
                created
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Starts watching `folder` (non-recursively).
///
/// The returned watcher must be kept alive for as long as events are wanted;
/// dropping it closes the channel.
pub fn watch_folder(folder: &Path) -> Result<(RecommendedWatcher, mpsc::Receiver<FileCreatedEvent>)> {
    let (tx, rx) = mpsc::channel(EVENT_BUFFER);

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        let event = match res {
            Ok(event) => event,
            Err(e) => {
                error!(error = %e, "Watch error");
                return;
            }
        };
        for created in created_files(&event) {
            debug!(file = %created.full_path().display(), "File created");
            if tx.blocking_send(created).is_err() {
                warn!("Dispatcher is gone; dropping file event");
                return;
            }
        }
    })
    .context("Failed to create directory watcher")?;

    watcher
        .watch(folder, RecursiveMode::NonRecursive)
        .with_context(|| format!("Failed to watch {}", folder.display()))?;
    info!(folder = %folder.display(), "Watching folder for new files");

    Ok((watcher, rx))
}
