//! Daemon socket endpoints and their `unix://` and `udp://` URL forms.

use std::fmt;
use std::fs::DirBuilder;
use std::io;
use std::net::IpAddr;
use std::str::FromStr;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Where the daemon listens and clients connect.
///
/// Unix endpoints carry one request per stream connection; UDP endpoints carry
/// one request per datagram and stay on the local host.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "transport", rename_all = "snake_case")]
pub enum SocketEndpoint {
    /// Unix domain stream socket.
    Unix {
        /// Filesystem location of the socket.
        path: Utf8PathBuf,
    },
    /// UDP datagram socket on a local address.
    Udp {
        /// `localhost` or a loopback IP literal, without brackets.
        host: String,
        /// Port number. Zero asks the OS for an ephemeral port when binding.
        port: u16,
    },
}

impl SocketEndpoint {
    /// Builds a Unix domain socket endpoint.
    #[must_use]
    pub fn unix(path: impl Into<Utf8PathBuf>) -> Self {
        Self::Unix { path: path.into() }
    }

    /// Builds a UDP datagram endpoint.
    ///
    /// No host validation happens here; parsed endpoints are checked by
    /// [`FromStr`].
    #[must_use]
    pub fn udp(host: impl Into<String>, port: u16) -> Self {
        Self::Udp {
            host: host.into(),
            port,
        }
    }

    /// Returns the socket path for Unix endpoints.
    #[must_use]
    pub fn unix_path(&self) -> Option<&Utf8Path> {
        match self {
            Self::Unix { path } => Some(path.as_ref()),
            Self::Udp { .. } => None,
        }
    }

    /// Creates the directory that will hold a Unix socket.
    ///
    /// New directories are private to the owner. UDP endpoints need nothing.
    ///
    /// # Errors
    ///
    /// Fails when the path has no parent or the directory cannot be created.
    pub fn prepare_filesystem(&self) -> Result<(), SocketPreparationError> {
        match self.unix_path() {
            Some(path) => create_socket_directory(path),
            None => Ok(()),
        }
    }
}

fn create_socket_directory(path: &Utf8Path) -> Result<(), SocketPreparationError> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .ok_or_else(|| SocketPreparationError::MissingParent {
            path: path.to_path_buf(),
        })?;

    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }

    match builder.create(parent.as_std_path()) {
        Err(source) if source.kind() != io::ErrorKind::AlreadyExists => {
            Err(SocketPreparationError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}

impl fmt::Display for SocketEndpoint {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unix { path } => write!(formatter, "unix://{path}"),
            Self::Udp { host, port } if host.contains(':') => {
                write!(formatter, "udp://[{host}]:{port}")
            }
            Self::Udp { host, port } => write!(formatter, "udp://{host}:{port}"),
        }
    }
}

impl FromStr for SocketEndpoint {
    type Err = SocketParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let url = Url::parse(input)?;
        match url.scheme() {
            "unix" => parse_unix(&url, input),
            "udp" => parse_udp(&url, input),
            other => Err(SocketParseError::UnsupportedScheme(other.to_owned())),
        }
    }
}

fn parse_unix(url: &Url, input: &str) -> Result<SocketEndpoint, SocketParseError> {
    // `unix://run/gsnipd.sock` would otherwise lose `run` to the host slot.
    if url.host_str().is_some_and(|host| !host.is_empty()) {
        return Err(SocketParseError::UnixAuthority(input.to_owned()));
    }
    match url.path() {
        "" | "/" => Err(SocketParseError::MissingUnixPath(input.to_owned())),
        path => Ok(SocketEndpoint::unix(path)),
    }
}

fn parse_udp(url: &Url, input: &str) -> Result<SocketEndpoint, SocketParseError> {
    let host = url
        .host_str()
        .map(|host| host.trim_start_matches('[').trim_end_matches(']'))
        .filter(|host| !host.is_empty())
        .ok_or_else(|| SocketParseError::MissingHost(input.to_owned()))?;
    if !is_local_host(host) {
        return Err(SocketParseError::NonLocalHost {
            host: host.to_owned(),
        });
    }
    match url.port() {
        None => Err(SocketParseError::MissingPort(input.to_owned())),
        Some(0) => Err(SocketParseError::EphemeralPort(input.to_owned())),
        Some(port) => Ok(SocketEndpoint::udp(host, port)),
    }
}

fn is_local_host(host: &str) -> bool {
    host.eq_ignore_ascii_case("localhost")
        || host
            .parse::<IpAddr>()
            .is_ok_and(|address| address.is_loopback())
}

/// Errors encountered while parsing a [`SocketEndpoint`] from text.
#[derive(Debug, Error)]
pub enum SocketParseError {
    /// Scheme was neither `unix` nor `udp`.
    #[error("unsupported socket scheme '{0}'")]
    UnsupportedScheme(String),
    /// UDP host name was missing.
    #[error("missing UDP host in '{0}'")]
    MissingHost(String),
    /// UDP host is not on this machine.
    #[error("UDP host '{host}' is not a loopback address")]
    NonLocalHost {
        /// Rejected host.
        host: String,
    },
    /// UDP port was missing from the address.
    #[error("missing UDP port in '{0}'")]
    MissingPort(String),
    /// Port zero gives clients nothing to connect to.
    #[error("UDP port 0 in '{0}' is not a fixed address")]
    EphemeralPort(String),
    /// Unix socket path was absent.
    #[error("missing Unix socket path in '{0}'")]
    MissingUnixPath(String),
    /// A Unix URL named a host, usually from a missing third slash.
    #[error("unix socket URL '{0}' must use an absolute path (unix:///...)")]
    UnixAuthority(String),
    /// URL failed to parse.
    #[error(transparent)]
    Url(#[from] url::ParseError),
}

/// Errors raised when preparing socket directories.
#[derive(Debug, Error)]
pub enum SocketPreparationError {
    /// The socket path has no directory component.
    #[error("socket path '{path}' has no parent directory")]
    MissingParent {
        /// Configured socket path.
        path: Utf8PathBuf,
    },
    /// The socket directory could not be created.
    #[error("failed to create socket directory '{path}': {source}")]
    CreateDirectory {
        /// Directory that could not be created.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}
