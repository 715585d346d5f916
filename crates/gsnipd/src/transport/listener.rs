//! Listener implementation for the daemon socket.

use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread;
use std::time::Duration;

use tracing::{info, warn};

use gsnip_config::SocketEndpoint;

use super::handler::{MAX_DATAGRAM_BYTES, serve_datagram};
use super::{LISTENER_TARGET, ListenerError, MessageHandler};

#[cfg(unix)]
use super::handler::serve_stream;
#[cfg(unix)]
use camino::Utf8Path;
#[cfg(unix)]
use std::fs;
#[cfg(unix)]
use std::os::unix::fs::FileTypeExt;
#[cfg(unix)]
use std::os::unix::net::{UnixListener, UnixStream};

const ACCEPT_BACKOFF: Duration = Duration::from_millis(25);
const ERROR_BACKOFF: Duration = Duration::from_millis(150);

/// Listener bound to the daemon endpoint and not yet serving.
#[derive(Debug)]
pub struct SocketListener {
    endpoint: SocketEndpoint,
    listener: ListenerKind,
}

#[derive(Debug)]
enum ListenerKind {
    Udp(Arc<UdpSocket>),
    #[cfg(unix)]
    Unix(UnixListener),
}

/// One unit of inbound work picked up by the accept loop.
enum Inbound {
    #[cfg(unix)]
    Stream(UnixStream),
    Datagram { peer: SocketAddr, payload: Vec<u8> },
}

impl SocketListener {
    /// Binds the endpoint.
    ///
    /// A leftover Unix socket file that nobody answers on is removed first.
    ///
    /// # Errors
    ///
    /// Fails when the address cannot be resolved or bound, when a live
    /// daemon already owns the Unix socket path, or when something other
    /// than a socket occupies it.
    pub fn bind(endpoint: &SocketEndpoint) -> Result<Self, ListenerError> {
        match endpoint {
            SocketEndpoint::Udp { host, port } => {
                let socket = bind_udp(host, *port)?;
                Ok(Self {
                    endpoint: endpoint.clone(),
                    listener: ListenerKind::Udp(Arc::new(socket)),
                })
            }
            SocketEndpoint::Unix { path } => {
                #[cfg(unix)]
                {
                    let listener = bind_unix(path)?;
                    Ok(Self {
                        endpoint: endpoint.clone(),
                        listener: ListenerKind::Unix(listener),
                    })
                }

                #[cfg(not(unix))]
                {
                    let _ = path;
                    Err(ListenerError::UnsupportedUnix {
                        endpoint: endpoint.to_string(),
                    })
                }
            }
        }
    }

    /// Endpoint this listener is bound to.
    #[must_use]
    pub const fn endpoint(&self) -> &SocketEndpoint {
        &self.endpoint
    }

    /// Local address of a UDP listener, useful when bound to port zero.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        match &self.listener {
            ListenerKind::Udp(socket) => socket.local_addr().ok(),
            #[cfg(unix)]
            ListenerKind::Unix(_) => None,
        }
    }

    /// Starts serving on a background thread.
    ///
    /// # Errors
    ///
    /// Fails when the socket cannot be made non-blocking. The Unix socket
    /// file is removed in that case.
    pub fn start(
        self,
        handler: Arc<dyn MessageHandler>,
    ) -> Result<ListenerHandle, ListenerError> {
        let shutdown = Arc::new(AtomicBool::new(false));
        if let Err(error) = match &self.listener {
            ListenerKind::Udp(socket) => socket.set_nonblocking(true),
            #[cfg(unix)]
            ListenerKind::Unix(listener) => listener.set_nonblocking(true),
        } {
            #[cfg(unix)]
            cleanup_unix_socket(&self.endpoint);
            return Err(ListenerError::NonBlocking { source: error });
        }
        let shutdown_flag = Arc::clone(&shutdown);
        let handle = thread::spawn(move || run_accept_loop(&self, &shutdown_flag, &handler));
        Ok(ListenerHandle {
            shutdown,
            handle: Some(handle),
        })
    }
}

/// Handle to the background listener thread.
#[derive(Debug)]
pub struct ListenerHandle {
    shutdown: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ListenerHandle {
    /// Asks the accept loop to stop after its current iteration.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Waits for the accept loop to exit.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::ThreadPanic`] if the listener thread panicked.
    pub fn join(mut self) -> Result<(), ListenerError> {
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| ListenerError::ThreadPanic),
            None => Ok(()),
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

fn run_accept_loop(
    listener: &SocketListener,
    shutdown: &AtomicBool,
    handler: &Arc<dyn MessageHandler>,
) {
    info!(
        target: LISTENER_TARGET,
        endpoint = %listener.endpoint,
        "socket listener active"
    );
    let mut buffer = vec![0_u8; MAX_DATAGRAM_BYTES];
    let mut last_error = None::<io::ErrorKind>;
    while !shutdown.load(Ordering::SeqCst) {
        match accept_inbound(listener, &mut buffer) {
            Ok(Some(inbound)) => {
                last_error = None;
                dispatch_inbound(listener, inbound, Arc::clone(handler));
            }
            Ok(None) => {
                thread::sleep(ACCEPT_BACKOFF);
            }
            Err(error) => {
                let kind = error.kind();
                if last_error != Some(kind) {
                    warn!(
                        target: LISTENER_TARGET,
                        error = %error,
                        "socket accept error"
                    );
                }
                last_error = Some(kind);
                thread::sleep(ERROR_BACKOFF);
            }
        }
    }

    info!(target: LISTENER_TARGET, endpoint = %listener.endpoint, "socket listener stopped");
    #[cfg(unix)]
    cleanup_unix_socket(&listener.endpoint);
}

fn accept_inbound(
    listener: &SocketListener,
    buffer: &mut [u8],
) -> Result<Option<Inbound>, io::Error> {
    match &listener.listener {
        ListenerKind::Udp(socket) => match socket.recv_from(buffer) {
            Ok((size, peer)) => Ok(Some(Inbound::Datagram {
                peer,
                payload: buffer[..size].to_vec(),
            })),
            Err(error) if error.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(error) => Err(error),
        },
        #[cfg(unix)]
        ListenerKind::Unix(unix) => match unix.accept() {
            Ok((stream, _)) => {
                stream.set_nonblocking(false)?;
                Ok(Some(Inbound::Stream(stream)))
            }
            Err(error) if error.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(error) => Err(error),
        },
    }
}

fn dispatch_inbound(listener: &SocketListener, inbound: Inbound, handler: Arc<dyn MessageHandler>) {
    match inbound {
        #[cfg(unix)]
        Inbound::Stream(stream) => {
            thread::spawn(move || serve_stream(stream, handler.as_ref()));
        }
        Inbound::Datagram { peer, payload } => {
            let ListenerKind::Udp(socket) = &listener.listener else {
                return;
            };
            let socket = Arc::clone(socket);
            thread::spawn(move || serve_datagram(&socket, peer, &payload, handler.as_ref()));
        }
    }
}

fn bind_udp(host: &str, port: u16) -> Result<UdpSocket, ListenerError> {
    let mut addrs = (host, port)
        .to_socket_addrs()
        .map_err(|source| ListenerError::Resolve {
            host: host.to_owned(),
            port,
            source,
        })?;
    let addr = addrs.next().ok_or_else(|| ListenerError::ResolveEmpty {
        host: host.to_owned(),
        port,
    })?;
    UdpSocket::bind(addr).map_err(|source| ListenerError::BindUdp { addr, source })
}

#[cfg(unix)]
fn bind_unix(path: &Utf8Path) -> Result<UnixListener, ListenerError> {
    if path.exists() {
        let metadata =
            fs::symlink_metadata(path).map_err(|source| ListenerError::UnixMetadata {
                path: path.to_path_buf(),
                source,
            })?;
        if !metadata.file_type().is_socket() {
            return Err(ListenerError::UnixNotSocket {
                path: path.to_path_buf(),
            });
        }
        match UnixStream::connect(path) {
            Ok(_stream) => {
                return Err(ListenerError::UnixInUse {
                    path: path.to_path_buf(),
                });
            }
            Err(error)
                if matches!(
                    error.kind(),
                    io::ErrorKind::ConnectionRefused | io::ErrorKind::NotFound
                ) =>
            {
                fs::remove_file(path).map_err(|source| ListenerError::UnixCleanup {
                    path: path.to_path_buf(),
                    source,
                })?;
                info!(target: LISTENER_TARGET, %path, "removed stale unix socket");
            }
            Err(source) => {
                return Err(ListenerError::UnixConnect {
                    path: path.to_path_buf(),
                    source,
                });
            }
        }
    }

    UnixListener::bind(path).map_err(|source| ListenerError::BindUnix {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(unix)]
fn cleanup_unix_socket(endpoint: &SocketEndpoint) {
    let Some(path) = endpoint.unix_path() else {
        return;
    };
    if let Err(error) = fs::remove_file(path)
        && error.kind() != io::ErrorKind::NotFound
    {
        warn!(
            target: LISTENER_TARGET,
            error = %error,
            path = %path,
            "failed to remove unix socket file"
        );
    }
}
