//! Daemon lifecycle: startup, signal supervision and orderly shutdown.

mod errors;
mod launch;
mod signals;

pub use self::errors::LaunchError;
pub use self::launch::{ConfigLoader, Daemon, StaticConfigLoader, SystemConfigLoader, run_daemon};
#[cfg(test)]
pub(crate) use self::launch::run_daemon_with;
pub use self::signals::{ControlEvent, ControlSignal, SignalError, SystemControlSignal};

pub(crate) const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");
