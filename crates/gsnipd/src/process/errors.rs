//! Defines the unified error surface for daemon launch and supervision.

use std::io;

use camino::Utf8PathBuf;
use thiserror::Error;

use gsnip_config::{ConfigError, SocketPreparationError};

use crate::backing_file::FileError;
use crate::manager::ManagerError;
use crate::telemetry::TelemetryError;
use crate::transport::ListenerError;

use super::signals::SignalError;

/// Errors surfaced while launching or supervising the daemon process.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Configuration failed to load, or help output was requested.
    #[error("failed to load configuration: {source}")]
    Config {
        /// Underlying configuration error.
        #[source]
        source: ConfigError,
    },
    /// Telemetry could not be initialised.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// Preparing the socket directory failed.
    #[error("failed to prepare daemon socket: {source}")]
    Socket {
        /// Underlying filesystem error.
        #[source]
        source: SocketPreparationError,
    },
    /// The directory holding the snippet file could not be created.
    #[error("failed to create snippet directory '{path}': {source}")]
    SnippetDirectory {
        /// Directory that could not be created.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The snippet file could not be opened.
    #[error("failed to open snippet file: {source}")]
    File {
        /// Underlying file error.
        #[source]
        source: FileError,
    },
    /// The snippet file could not be loaded.
    #[error("failed to load snippets: {source}")]
    Manager {
        /// Underlying manager error.
        #[source]
        source: ManagerError,
    },
    /// Socket listener startup failed.
    #[error("daemon socket listener failed: {source}")]
    Listener {
        /// Underlying listener error.
        #[source]
        source: ListenerError,
    },
    /// Waiting for control signals failed.
    #[error("failed to await control signal: {source}")]
    Signal {
        /// Underlying signal error.
        #[source]
        source: SignalError,
    },
}

impl From<ConfigError> for LaunchError {
    fn from(source: ConfigError) -> Self {
        Self::Config { source }
    }
}

impl From<TelemetryError> for LaunchError {
    fn from(source: TelemetryError) -> Self {
        Self::Telemetry { source }
    }
}

impl From<SocketPreparationError> for LaunchError {
    fn from(source: SocketPreparationError) -> Self {
        Self::Socket { source }
    }
}

impl From<FileError> for LaunchError {
    fn from(source: FileError) -> Self {
        Self::File { source }
    }
}

impl From<ManagerError> for LaunchError {
    fn from(source: ManagerError) -> Self {
        Self::Manager { source }
    }
}

impl From<ListenerError> for LaunchError {
    fn from(source: ListenerError) -> Self {
        Self::Listener { source }
    }
}

impl From<SignalError> for LaunchError {
    fn from(source: SignalError) -> Self {
        Self::Signal { source }
    }
}
