//! Readiness gate: decides whether a freshly created file has been fully
//! written by its producer.
//!
//! A file is ready when it can be opened for reading, an exclusive
//! non-blocking lock can be taken on it, and it is a non-empty regular file.
//! The lock is released immediately; it only serves as a "nobody is writing
//! this" check.

use std::fs::File;
use std::path::Path;
use std::time::Duration;

use tracing::debug;

pub fn is_ready(path: &Path) -> bool {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "File cannot be opened yet");
            return false;
        }
    };
    if let Err(e) = file.try_lock() {
        debug!(path = %path.display(), error = %e, "File is still locked by another process");
        return false;
    }
    match file.metadata() {
        Ok(meta) => meta.is_file() && meta.len() > 0,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "File metadata unavailable");
            false
        }
    }
}

/// Polls [`is_ready`] up to `max_polls` times, sleeping `poll_interval`
/// after each negative answer, then reports the final state.
pub async fn wait_until_ready(path: &Path, poll_interval: Duration, max_polls: u32) -> bool {
    let mut polls = 0;
    while polls < max_polls && !is_ready(path) {
        tokio::time::sleep(poll_interval).await;
        polls += 1;
    }
    is_ready(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn missing_file_is_not_ready() {
        let dir = tempdir().unwrap();
        assert!(!is_ready(&dir.path().join("nope.bin")));
    }

    #[test]
    fn empty_file_is_not_ready() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.bin");
        File::create(&path).unwrap();
        assert!(!is_ready(&path));
    }

    #[test]
    fn written_file_is_ready() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("done.bin");
        File::create(&path).unwrap().write_all(b"payload").unwrap();
        assert!(is_ready(&path));
    }

    #[test]
    fn directory_is_never_ready() {
        let dir = tempdir().unwrap();
        let sub = dir.path().join("batch");
        std::fs::create_dir(&sub).unwrap();
        std::fs::write(sub.join("inside.txt"), b"x").unwrap();
        assert!(!is_ready(&sub));
    }

    #[test]
    fn locked_file_becomes_ready_once_writer_releases_it() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("busy.bin");
        let mut writer = File::create(&path).unwrap();
        writer.lock().unwrap();
        writer.write_all(b"partial").unwrap();

        assert!(!is_ready(&path));

        writer.unlock().unwrap();
        drop(writer);
        assert!(is_ready(&path));
    }

    #[tokio::test(start_paused = true)]
    async fn wait_gives_up_after_poll_budget() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("never.bin");
        let interval = Duration::from_secs(60);

        let start = tokio::time::Instant::now();
        let ready = wait_until_ready(&path, interval, 2).await;

        assert!(!ready);
        assert!(start.elapsed() >= interval * 2);
        assert!(start.elapsed() < interval * 3);
    }

    #[tokio::test(start_paused = true)]
    async fn wait_returns_immediately_for_ready_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ready.bin");
        File::create(&path).unwrap().write_all(b"x").unwrap();

        let start = tokio::time::Instant::now();
        assert!(wait_until_ready(&path, Duration::from_secs(60), 5).await);
        assert!(start.elapsed() < Duration::from_secs(60));
    }
}
