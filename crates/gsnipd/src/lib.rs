//! The gsnip snippet daemon.
//!
//! `gsnipd` keeps a set of named text snippets in memory, backed by a single
//! flat file, and serves them to clients over a local Unix or UDP socket.
//! Each message carries one opcode such as `@FND` or `@INS` (see
//! [`gsnip_protocol`]) and receives exactly one reply.
//!
//! The layers, leaves first:
//!
//! - [`parser`] turns the `startsnip`/`endsnip` text format into
//!   [`Snippet`] records and rejects malformed input as a whole.
//! - [`container`] enforces name uniqueness behind a reader/writer lock.
//! - [`backing_file`] owns the file and serialises every raw operation on it.
//! - [`manager`] executes requests and keeps file and memory consistent by
//!   rewriting the file and reloading it after every mutation.
//! - [`transport`] and [`dispatch`] accept connections or datagrams and route
//!   payloads to the manager.
//!
//! [`run_daemon`] wires these together and reloads the file on `SIGHUP`
//! without dropping the listening socket.

pub mod backing_file;
pub mod container;
mod dispatch;
pub mod manager;
pub mod parser;
mod process;
pub mod snippet;
mod telemetry;
pub mod transport;

pub use backing_file::{BackingFile, FileError};
pub use container::{ContainerError, SnippetContainer};
pub use dispatch::DispatchHandler;
pub use manager::{Manager, ManagerError};
pub use parser::{ParseError, SnippetParser};
pub use process::{
    ConfigLoader, ControlEvent, ControlSignal, Daemon, LaunchError, SignalError,
    StaticConfigLoader, SystemConfigLoader, SystemControlSignal, run_daemon,
};
pub use snippet::Snippet;
pub use telemetry::{TelemetryError, TelemetryHandle, initialise as initialise_telemetry};

#[cfg(test)]
mod tests;
