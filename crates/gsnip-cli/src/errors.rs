//! Error types for the CLI runtime.

use std::io;

use camino::Utf8PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to resolve daemon address {endpoint}: {source}")]
    Resolve { endpoint: String, source: io::Error },
    #[error("failed to connect to daemon at {endpoint}: {source}")]
    Connect { endpoint: String, source: io::Error },
    #[cfg(not(unix))]
    #[error("platform does not support Unix sockets: {0}")]
    UnsupportedUnixTransport(String),
    #[error("failed to send request to daemon: {0}")]
    SendRequest(io::Error),
    #[error("failed to read response from daemon: {0}")]
    ReadResponse(io::Error),
    #[error("failed to read snippets from {path}: {source}")]
    ReadInputFile { path: Utf8PathBuf, source: io::Error },
    #[error("failed to read snippets from stdin: {0}")]
    ReadStdin(io::Error),
    #[error("insert needs at least one startsnip block")]
    EmptyInsert,
    #[error("daemon reported an error for {command}")]
    DaemonFailure { command: &'static str },
    #[error("failed to write output: {0}")]
    WriteOutput(io::Error),
}

impl AppError {
    /// Returns true when the daemon is most likely not running.
    pub(crate) fn is_daemon_not_running(&self) -> bool {
        match self {
            Self::Connect { source, .. } => matches!(
                source.kind(),
                io::ErrorKind::ConnectionRefused
                    | io::ErrorKind::NotFound
                    | io::ErrorKind::AddrNotAvailable
            ),
            _ => false,
        }
    }
}
