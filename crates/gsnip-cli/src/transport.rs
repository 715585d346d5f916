//! Socket transport helpers for the gsnip client.
//!
//! One request goes out per invocation. Over a Unix socket the client
//! half-closes after writing so the daemon sees the end of the request, then
//! reads the reply until the daemon closes. Over UDP the request and the
//! reply are one datagram each.

use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::Duration;

use gsnip_config::SocketEndpoint;

#[cfg(unix)]
use std::io::{Read, Write};
#[cfg(unix)]
use std::net::Shutdown;
#[cfg(unix)]
use std::os::fd::OwnedFd;
#[cfg(unix)]
use std::os::unix::net::UnixStream;

#[cfg(unix)]
use socket2::{Domain, SockAddr, Socket, Type};

use super::AppError;

#[cfg(unix)]
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);
const RESPONSE_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_DATAGRAM_BYTES: usize = 65_507;

/// Sends `payload` to the daemon and returns the raw reply.
pub(super) fn exchange(endpoint: &SocketEndpoint, payload: &[u8]) -> Result<Vec<u8>, AppError> {
    match endpoint {
        SocketEndpoint::Udp { host, port } => {
            let address = resolve_udp_address(host, *port).map_err(|source| AppError::Resolve {
                endpoint: endpoint.to_string(),
                source,
            })?;
            exchange_udp(address, payload).map_err(|error| error.into_app_error(endpoint))
        }
        SocketEndpoint::Unix { path } => {
            #[cfg(unix)]
            {
                exchange_unix(path.as_str(), payload).map_err(|error| error.into_app_error(endpoint))
            }

            #[cfg(not(unix))]
            {
                let _ = (path, payload);
                Err(AppError::UnsupportedUnixTransport(endpoint.to_string()))
            }
        }
    }
}

/// Which leg of the exchange failed.
enum Exchange {
    Connect(io::Error),
    Send(io::Error),
    Receive(io::Error),
}

impl Exchange {
    fn into_app_error(self, endpoint: &SocketEndpoint) -> AppError {
        match self {
            Self::Connect(source) => AppError::Connect {
                endpoint: endpoint.to_string(),
                source,
            },
            Self::Send(source) => AppError::SendRequest(source),
            Self::Receive(source) => AppError::ReadResponse(source),
        }
    }
}

fn resolve_udp_address(host: &str, port: u16) -> io::Result<SocketAddr> {
    let mut addrs = (host, port).to_socket_addrs()?;
    addrs
        .next()
        .ok_or_else(|| io::Error::new(io::ErrorKind::AddrNotAvailable, "no resolved addresses"))
}

fn exchange_udp(address: SocketAddr, payload: &[u8]) -> Result<Vec<u8>, Exchange> {
    let local: SocketAddr = match address {
        SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
        SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
    };
    let socket = UdpSocket::bind(local).map_err(Exchange::Connect)?;
    socket.connect(address).map_err(Exchange::Connect)?;
    socket
        .set_read_timeout(Some(RESPONSE_TIMEOUT))
        .map_err(Exchange::Connect)?;
    socket.send(payload).map_err(Exchange::Send)?;
    let mut buffer = vec![0_u8; MAX_DATAGRAM_BYTES];
    let size = socket.recv(&mut buffer).map_err(Exchange::Receive)?;
    buffer.truncate(size);
    Ok(buffer)
}

#[cfg(unix)]
fn exchange_unix(path: &str, payload: &[u8]) -> Result<Vec<u8>, Exchange> {
    let mut stream = connect_unix(path).map_err(Exchange::Connect)?;
    stream
        .write_all(payload)
        .and_then(|()| stream.flush())
        .and_then(|()| stream.shutdown(Shutdown::Write))
        .map_err(Exchange::Send)?;
    stream
        .set_read_timeout(Some(RESPONSE_TIMEOUT))
        .map_err(Exchange::Receive)?;
    let mut reply = Vec::new();
    stream.read_to_end(&mut reply).map_err(Exchange::Receive)?;
    Ok(reply)
}

#[cfg(unix)]
fn connect_unix(path: &str) -> io::Result<UnixStream> {
    let socket = Socket::new(Domain::UNIX, Type::STREAM, None)?;
    let address = SockAddr::unix(path)?;
    socket.connect_timeout(&address, CONNECTION_TIMEOUT)?;
    Ok(UnixStream::from(OwnedFd::from(socket)))
}
