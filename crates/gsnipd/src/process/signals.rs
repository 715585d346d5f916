use std::io;
use std::sync::Mutex;

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;
use thiserror::Error;
use tracing::info;

use super::PROCESS_TARGET;

/// What the supervisor should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    /// Reread the snippet file without dropping the socket.
    Reload,
    /// Stop serving and exit.
    Shutdown,
}

/// Source of out-of-band control events.
pub trait ControlSignal: Send + Sync {
    /// Blocks until the next control event arrives.
    ///
    /// # Errors
    ///
    /// Fails when the underlying source cannot be read.
    fn wait(&self) -> Result<ControlEvent, SignalError>;
}

/// Errors reported by control signal sources.
#[derive(Debug, Error)]
pub enum SignalError {
    /// Installing signal handlers failed.
    #[error("failed to install signal handlers: {source}")]
    Install {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The signal iterator lock was poisoned.
    #[error("signal listener lock poisoned")]
    Poisoned,
}

/// Maps process signals onto control events.
///
/// `SIGHUP` requests a reload. `SIGTERM`, `SIGINT` and `SIGQUIT` request
/// shutdown.
#[derive(Debug)]
pub struct SystemControlSignal {
    signals: Mutex<Signals>,
}

impl SystemControlSignal {
    /// Registers the handled signals. From here on they no longer carry
    /// their default disposition.
    ///
    /// # Errors
    ///
    /// Returns [`SignalError::Install`] if registration fails.
    pub fn install() -> Result<Self, SignalError> {
        let signals = Signals::new([SIGHUP, SIGTERM, SIGINT, SIGQUIT])
            .map_err(|source| SignalError::Install { source })?;
        Ok(Self {
            signals: Mutex::new(signals),
        })
    }
}

impl ControlSignal for SystemControlSignal {
    fn wait(&self) -> Result<ControlEvent, SignalError> {
        let mut signals = self.signals.lock().map_err(|_| SignalError::Poisoned)?;
        let Some(signal) = signals.forever().next() else {
            return Ok(ControlEvent::Shutdown);
        };
        let event = if signal == SIGHUP {
            ControlEvent::Reload
        } else {
            ControlEvent::Shutdown
        };
        info!(target: PROCESS_TARGET, signal, ?event, "control signal received");
        Ok(event)
    }
}
