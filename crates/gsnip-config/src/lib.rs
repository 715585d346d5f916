//! Shared configuration for the gsnip daemon and client.
//!
//! Both binaries agree on where the daemon listens and how it logs. Values
//! resolve in three layers: command-line flags win over `GSNIP_*` environment
//! variables, which win over the built-in defaults in [`defaults`].

use std::ffi::OsString;

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser};
use thiserror::Error;

pub mod defaults;
mod logging;
mod socket;

pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_UDP_PORT, default_log_filter, default_log_format,
    default_snippet_file, default_socket_endpoint,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use socket::{SocketEndpoint, SocketParseError, SocketPreparationError};

/// Environment variable overriding the daemon socket endpoint.
pub const SOCKET_ENV_VAR: &str = "GSNIP_DAEMON_SOCKET";
/// Environment variable overriding the snippet source file.
pub const SNIPPET_FILE_ENV_VAR: &str = "GSNIP_SNIPPET_FILE";
/// Environment variable overriding the log filter.
pub const LOG_FILTER_ENV_VAR: &str = "GSNIP_LOG_FILTER";
/// Environment variable overriding the log format.
pub const LOG_FORMAT_ENV_VAR: &str = "GSNIP_LOG_FORMAT";

/// Configuration flags shared by every gsnip binary.
///
/// Flatten this into a binary's own `clap` parser so the flags and their
/// environment fallbacks stay identical across the daemon and the client.
#[derive(Debug, Clone, Default, Args)]
pub struct ConfigArgs {
    /// Socket endpoint, for example `unix:///run/user/1000/gsnip/gsnipd.sock`
    /// or `udp://127.0.0.1:9797`.
    #[arg(long, env = SOCKET_ENV_VAR, value_name = "ENDPOINT")]
    pub daemon_socket: Option<SocketEndpoint>,
    /// Snippet source file served by the daemon.
    #[arg(long, env = SNIPPET_FILE_ENV_VAR, value_name = "PATH")]
    pub snippet_file: Option<Utf8PathBuf>,
    /// Tracing filter expression, for example `gsnipd=debug`.
    #[arg(long, env = LOG_FILTER_ENV_VAR, value_name = "FILTER")]
    pub log_filter: Option<String>,
    /// Log output format (`json` or `compact`).
    #[arg(long, env = LOG_FORMAT_ENV_VAR, value_name = "FORMAT")]
    pub log_format: Option<LogFormat>,
}

#[derive(Debug, Parser)]
#[command(name = "gsnipd", about = "Serve snippets from a flat file over a local socket")]
struct ConfigCli {
    #[command(flatten)]
    config: ConfigArgs,
}

/// Errors surfaced while resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Command-line parsing failed, or help/version output was requested.
    #[error("{0}")]
    Cli(#[from] clap::Error),
}

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Endpoint the daemon listens on and the client connects to.
    pub daemon_socket: SocketEndpoint,
    /// Flat file holding the snippets.
    pub snippet_file: Utf8PathBuf,
    /// Tracing filter expression.
    pub log_filter: String,
    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self::from(ConfigArgs::default())
    }
}

impl From<ConfigArgs> for Config {
    fn from(args: ConfigArgs) -> Self {
        Self {
            daemon_socket: args.daemon_socket.unwrap_or_else(default_socket_endpoint),
            snippet_file: args.snippet_file.unwrap_or_else(default_snippet_file),
            log_filter: args
                .log_filter
                .unwrap_or_else(|| default_log_filter().to_owned()),
            log_format: args.log_format.unwrap_or_else(default_log_format),
        }
    }
}

impl Config {
    /// Loads configuration from the process arguments and environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Cli`] when the arguments do not parse.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_iter(std::env::args_os())
    }

    /// Loads configuration from an explicit argument list.
    ///
    /// The first item is treated as the binary name, matching `clap`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Cli`] when the arguments do not parse.
    pub fn load_from_iter<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let cli = ConfigCli::try_parse_from(args)?;
        Ok(Self::from(cli.config))
    }

    /// Endpoint the daemon listens on.
    #[must_use]
    pub fn daemon_socket(&self) -> &SocketEndpoint {
        &self.daemon_socket
    }

    /// Snippet source file.
    #[must_use]
    pub fn snippet_file(&self) -> &Utf8Path {
        &self.snippet_file
    }

    /// Tracing filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }
}
