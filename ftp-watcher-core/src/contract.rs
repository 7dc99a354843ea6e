//! # contract: collaborator interfaces for the upload pipeline
//!
//! This module defines the event type produced by the directory watcher and
//! the [`TransferClient`] trait implemented by the FTP client (and by mocks
//! in tests).
//!
//! ## Error Handling
//! - Every remote operation returns [`TransferError`], a boxed error.
//! - Callers never inspect the error kind: any failure is a retry trigger.
//!
//! ## Mocking & Testing
//! - The trait is annotated for `mockall`; `MockTransferClient` is exported
//!   behind the default `test-export-mocks` feature so integration tests can use it.

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use mockall::automock;

/// Error returned by any remote operation.
pub type TransferError = Box<dyn std::error::Error + Send + Sync>;

/// A file that appeared in the watched folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCreatedEvent {
    /// Directory the file was created in.
    pub directory: PathBuf,
    /// Bare file name, used as the remote file name.
    pub file_name: String,
}

impl FileCreatedEvent {
    pub fn new(directory: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            file_name: file_name.into(),
        }
    }

    /// Splits a full path into directory and file name.
    /// Returns `None` for paths without a UTF-8 file name (e.g. `/` or `..`).
    pub fn from_path(path: &Path) -> Option<Self> {
        let file_name = path.file_name()?.to_str()?.to_owned();
        let directory = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Some(Self {
            directory,
            file_name,
        })
    }

    pub fn full_path(&self) -> PathBuf {
        self.directory.join(&self.file_name)
    }
}

/// Login used for every remote operation.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Capability to talk to the remote file server.
///
/// URLs are full `ftp://host/path` strings. Directory URLs end in `/`.
/// Implementations open whatever connection they need per call; the
/// pipeline makes no assumption about connection reuse.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait TransferClient: Send + Sync {
    /// Store `content` at `destination_url`, creating or overwriting the remote file.
    async fn upload(
        &self,
        destination_url: &str,
        credentials: &Credentials,
        content: Vec<u8>,
    ) -> Result<(), TransferError>;

    /// List a remote directory. Succeeds only if the directory exists and is readable.
    async fn list_directory(&self, url: &str, credentials: &Credentials)
        -> Result<(), TransferError>;

    /// Create a single remote directory. Fails if the parent does not exist.
    async fn make_directory(&self, url: &str, credentials: &Credentials)
        -> Result<(), TransferError>;
}
