//! Shared fixtures: a scratch snippet file, an endpoint and a raw client.

use std::fs;
use std::io::{Read, Write};
use std::net::{SocketAddr, UdpSocket};
use std::sync::Mutex;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use camino::Utf8PathBuf;
use gsnip_config::{Config, LogFormat, SocketEndpoint};
use tempfile::TempDir;

use crate::process::{ControlEvent, ControlSignal, SignalError};

pub(super) const SEED: &str = "\
startsnip alpha \"first letter\"
a
endsnip

startsnip beta \"second letter\"
b
endsnip
";

/// Scratch directory holding the snippet file and the socket.
pub(super) struct Scratch {
    _dir: TempDir,
    pub(super) root: Utf8PathBuf,
}

impl Scratch {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 temp dir");
        Self { _dir: dir, root }
    }

    pub(super) fn snippet_file(&self) -> Utf8PathBuf {
        self.root.join("data").join("snippets")
    }

    pub(super) fn seed(&self, content: &str) {
        let path = self.snippet_file();
        fs::create_dir_all(path.parent().expect("snippet file has a parent"))
            .expect("create data dir");
        fs::write(path, content).expect("seed snippet file");
    }

    pub(super) fn unix_config(&self) -> Config {
        self.config(SocketEndpoint::unix(self.root.join("run").join("gsnipd.sock")))
    }

    pub(super) fn udp_config(&self) -> Config {
        self.config(SocketEndpoint::udp("127.0.0.1", 0))
    }

    fn config(&self, daemon_socket: SocketEndpoint) -> Config {
        Config {
            daemon_socket,
            snippet_file: self.snippet_file(),
            log_filter: String::from("warn"),
            log_format: LogFormat::Compact,
        }
    }
}

/// Where a test client should send its requests.
#[derive(Clone)]
pub(super) enum Target {
    #[cfg(unix)]
    Unix(Utf8PathBuf),
    Udp(SocketAddr),
}

impl Target {
    pub(super) fn request(&self, payload: &[u8]) -> Vec<u8> {
        match self {
            #[cfg(unix)]
            Self::Unix(path) => {
                use std::net::Shutdown;
                use std::os::unix::net::UnixStream;

                let mut stream = UnixStream::connect(path).expect("connect to daemon");
                stream.write_all(payload).expect("write request");
                stream.shutdown(Shutdown::Write).expect("half close");
                let mut reply = Vec::new();
                stream.read_to_end(&mut reply).expect("read reply");
                reply
            }
            Self::Udp(addr) => {
                let socket = UdpSocket::bind(("127.0.0.1", 0)).expect("bind client");
                socket
                    .set_read_timeout(Some(Duration::from_secs(2)))
                    .expect("client timeout");
                socket.send_to(payload, addr).expect("send request");
                let mut buffer = vec![0_u8; 64 * 1024];
                let (size, _) = socket.recv_from(&mut buffer).expect("receive reply");
                buffer.truncate(size);
                buffer
            }
        }
    }
}

/// Polls `probe` until it returns true or two seconds pass.
pub(super) fn eventually(mut probe: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if probe() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    false
}

/// Control source driven from the test thread.
pub(super) struct ChannelSignal {
    events: Mutex<Receiver<ControlEvent>>,
}

impl ChannelSignal {
    pub(super) fn new() -> (Sender<ControlEvent>, Self) {
        let (sender, receiver) = mpsc::channel();
        (
            sender,
            Self {
                events: Mutex::new(receiver),
            },
        )
    }
}

impl ControlSignal for ChannelSignal {
    fn wait(&self) -> Result<ControlEvent, SignalError> {
        let events = self.events.lock().map_err(|_| SignalError::Poisoned)?;
        Ok(events.recv().unwrap_or(ControlEvent::Shutdown))
    }
}
