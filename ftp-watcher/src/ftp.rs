#![doc = "FTP implementation of the core `TransferClient` contract."]
//
//! Every call opens its own control connection (connect, login, binary mode),
//! performs one command and quits. `suppaftp` is blocking, so each call runs on
//! tokio's blocking pool.
//!
//! Remote paths are taken relative to the login directory, so
//! `ftp://host/2024/3/a.txt` stores `2024/3/a.txt` under the user's home.
//!
//! Both the control connection and every passive data connection carry read
//! and write timeouts, so a server that stops answering turns into a
//! transfer error instead of a stuck job.

use std::io::Cursor;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use async_trait::async_trait;
use ftp_watcher_core::contract::{Credentials, TransferClient, TransferError};
use ftp_watcher_core::destination::RemoteUrl;
use suppaftp::types::FileType;
use suppaftp::{FtpError, FtpResult, FtpStream};

pub const DEFAULT_FTP_PORT: u16 = 21;
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
/// Longest a single read or write may block on any connection.
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy)]
struct Timeouts {
    connect: Duration,
    io: Duration,
}

pub struct FtpClient {
    timeouts: Timeouts,
}

impl Default for FtpClient {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_TIMEOUT)
    }
}

impl FtpClient {
    pub fn new(connect_timeout: Duration) -> Self {
        Self {
            timeouts: Timeouts {
                connect: connect_timeout,
                io: DEFAULT_IO_TIMEOUT,
            },
        }
    }

    pub fn with_io_timeout(mut self, io_timeout: Duration) -> Self {
        self.timeouts.io = io_timeout;
        self
    }

    async fn with_session<T, F>(
        &self,
        url: &str,
        credentials: &Credentials,
        command: F,
    ) -> Result<T, TransferError>
    where
        T: Send + 'static,
        F: FnOnce(&mut FtpStream, &RemoteUrl) -> Result<T, TransferError> + Send + 'static,
    {
        let remote =
            RemoteUrl::parse(url).ok_or_else(|| format!("not a valid remote URL: {url:?}"))?;
        let credentials = credentials.clone();
        let timeouts = self.timeouts;

        tokio::task::spawn_blocking(move || {
            let mut ftp = open_session(&remote, &credentials, timeouts)?;
            let result = command(&mut ftp, &remote);
            if let Err(e) = ftp.quit() {
                tracing::debug!(host = %remote.host, error = %e, "QUIT failed");
            }
            result
        })
        .await?
    }
}

/// TCP connect with `timeouts` applied to the resulting socket.
fn connect_stream(addr: SocketAddr, timeouts: Timeouts) -> FtpResult<TcpStream> {
    let stream =
        TcpStream::connect_timeout(&addr, timeouts.connect).map_err(FtpError::ConnectionError)?;
    stream
        .set_read_timeout(Some(timeouts.io))
        .map_err(FtpError::ConnectionError)?;
    stream
        .set_write_timeout(Some(timeouts.io))
        .map_err(FtpError::ConnectionError)?;
    Ok(stream)
}

fn open_session(
    remote: &RemoteUrl,
    credentials: &Credentials,
    timeouts: Timeouts,
) -> Result<FtpStream, TransferError> {
    let authority = remote.authority(DEFAULT_FTP_PORT);
    let addr = authority
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| format!("{authority} did not resolve to any address"))?;
    // The greeting is read inside `connect_with_stream`, so the timeouts must
    // already be on the socket.
    let mut ftp = FtpStream::connect_with_stream(connect_stream(addr, timeouts)?)?
        .passive_stream_builder(move |data_addr| connect_stream(data_addr, timeouts));
    ftp.login(credentials.user.as_str(), credentials.password.as_str())?;
    ftp.transfer_type(FileType::Binary)?;
    Ok(ftp)
}

#[async_trait]
impl TransferClient for FtpClient {
    async fn upload(
        &self,
        destination_url: &str,
        credentials: &Credentials,
        content: Vec<u8>,
    ) -> Result<(), TransferError> {
        tracing::debug!(url = destination_url, bytes = content.len(), "STOR");
        self.with_session(destination_url, credentials, move |ftp, remote| {
            let mut reader = Cursor::new(content);
            ftp.put_file(remote.path(), &mut reader)?;
            Ok(())
        })
        .await
    }

    async fn list_directory(
        &self,
        url: &str,
        credentials: &Credentials,
    ) -> Result<(), TransferError> {
        // Some servers answer LIST on a missing path with 226 and an empty
        // listing, so existence is decided by CWD.
        self.with_session(url, credentials, |ftp, remote| {
            let path = remote.path();
            if !path.is_empty() {
                ftp.cwd(&path)?;
            }
            Ok(())
        })
        .await
    }

    async fn make_directory(
        &self,
        url: &str,
        credentials: &Credentials,
    ) -> Result<(), TransferError> {
        self.with_session(url, credentials, |ftp, remote| {
            ftp.mkdir(remote.path())?;
            Ok(())
        })
        .await
    }
}
