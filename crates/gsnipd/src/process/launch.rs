//! Supervises daemon launch sequencing and runtime orchestration.

use std::fs;
use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};

use gsnip_config::{Config, ConfigError};

use crate::backing_file::BackingFile;
use crate::dispatch::DispatchHandler;
use crate::manager::Manager;
use crate::telemetry;
use crate::transport::{ListenerHandle, SocketListener};

use super::errors::LaunchError;
use super::signals::{ControlEvent, ControlSignal, SignalError, SystemControlSignal};
use super::PROCESS_TARGET;

/// Abstraction over configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the daemon configuration.
    ///
    /// # Errors
    ///
    /// Fails when the configuration sources do not parse.
    fn load(&self) -> Result<Config, ConfigError>;
}

/// Loader that delegates to [`Config::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, ConfigError> {
        Config::load()
    }
}

/// Loader that returns a fixed configuration.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps a ready configuration.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, ConfigError> {
        Ok(self.config.clone())
    }
}

/// Runs the daemon with the production collaborators until a shutdown
/// signal arrives.
///
/// # Errors
///
/// Any startup failure is returned and should end the process.
pub fn run_daemon() -> Result<(), LaunchError> {
    run_daemon_with(&SystemConfigLoader, SystemControlSignal::install)
}

/// Runs the daemon with injected collaborators.
pub(crate) fn run_daemon_with<L, S, F>(loader: &L, install_signals: F) -> Result<(), LaunchError>
where
    L: ConfigLoader,
    S: ControlSignal,
    F: FnOnce() -> Result<S, SignalError>,
{
    let config = loader.load()?;
    let _telemetry = telemetry::initialise(&config)?;
    info!(
        target: PROCESS_TARGET,
        endpoint = %config.daemon_socket(),
        snippet_file = %config.snippet_file(),
        "starting daemon runtime"
    );
    let control = install_signals()?;
    let daemon = Daemon::start(&config)?;
    daemon.supervise(&control)
}

/// A running daemon: the manager plus the listener serving it.
#[derive(Debug)]
pub struct Daemon {
    manager: Arc<Manager>,
    listener: ListenerHandle,
    local_addr: Option<SocketAddr>,
}

impl Daemon {
    /// Prepares the filesystem, loads the snippet file and starts serving.
    ///
    /// # Errors
    ///
    /// Fails when a directory cannot be created, the snippet file cannot be
    /// opened or parsed, or the socket cannot be bound.
    pub fn start(config: &Config) -> Result<Self, LaunchError> {
        config.daemon_socket().prepare_filesystem()?;
        let snippet_file = config.snippet_file();
        if let Some(parent) = snippet_file.parent()
            && !parent.as_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|source| LaunchError::SnippetDirectory {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let file = BackingFile::open(snippet_file)?;
        let manager = Arc::new(Manager::open(file)?);

        let listener = SocketListener::bind(config.daemon_socket())?;
        let local_addr = listener.local_addr();
        let handler = Arc::new(DispatchHandler::new(Arc::clone(&manager)));
        let listener = listener.start(handler)?;
        info!(target: PROCESS_TARGET, "daemon ready");
        Ok(Self {
            manager,
            listener,
            local_addr,
        })
    }

    /// Manager serving this daemon.
    #[must_use]
    pub const fn manager(&self) -> &Arc<Manager> {
        &self.manager
    }

    /// Bound UDP address, when serving over UDP.
    #[must_use]
    pub const fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Reacts to control events until shutdown, then stops the listener.
    ///
    /// A failed reload is logged and the previous snippets keep being
    /// served.
    ///
    /// # Errors
    ///
    /// Fails when the control source breaks or the listener thread panicked.
    /// The listener is stopped in either case.
    pub fn supervise<S: ControlSignal + ?Sized>(self, control: &S) -> Result<(), LaunchError> {
        let outcome = self.await_shutdown(control);
        self.stop()?;
        outcome
    }

    /// Stops the listener and waits for it to exit.
    ///
    /// # Errors
    ///
    /// Fails when the listener thread panicked.
    pub fn stop(self) -> Result<(), LaunchError> {
        self.listener.shutdown();
        self.listener.join()?;
        info!(target: PROCESS_TARGET, "shutdown sequence completed");
        Ok(())
    }

    fn await_shutdown<S: ControlSignal + ?Sized>(&self, control: &S) -> Result<(), LaunchError> {
        loop {
            match control.wait()? {
                ControlEvent::Reload => match self.manager.reload() {
                    Ok(()) => info!(target: PROCESS_TARGET, "snippets reloaded on signal"),
                    Err(error) => warn!(
                        target: PROCESS_TARGET,
                        %error,
                        "reload failed; serving previous snippets"
                    ),
                },
                ControlEvent::Shutdown => return Ok(()),
            }
        }
    }
}
