//! Request handling seam and the per-connection read/write cycle.

use std::net::{SocketAddr, UdpSocket};

#[cfg(unix)]
use std::io::{self, Read, Write};
#[cfg(unix)]
use std::os::unix::net::UnixStream;
#[cfg(unix)]
use std::time::Duration;

use gsnip_protocol::ERROR_MARKER;
use tracing::{debug, warn};

use super::LISTENER_TARGET;

/// Upper bound on a single request.
#[cfg(unix)]
pub(crate) const MAX_REQUEST_BYTES: usize = 1024 * 1024;
/// Largest payload a single UDP datagram can carry over IPv4.
pub(crate) const MAX_DATAGRAM_BYTES: usize = 65_507;

/// How long a fresh connection may stay silent before it is dropped.
#[cfg(unix)]
const FIRST_BYTE_TIMEOUT: Duration = Duration::from_secs(5);
/// Once data has arrived, this much silence ends the request.
#[cfg(unix)]
const QUIET_PERIOD: Duration = Duration::from_millis(200);
#[cfg(unix)]
const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Turns one raw request into one raw reply.
///
/// Implementations must always return some reply and should avoid panicking;
/// the transport writes whatever comes back.
pub trait MessageHandler: Send + Sync + 'static {
    /// Produces the reply for a request payload.
    fn respond(&self, request: &[u8]) -> Vec<u8>;
}

/// Serves exactly one request over an accepted stream, then closes it.
#[cfg(unix)]
pub(crate) fn serve_stream(mut stream: UnixStream, handler: &dyn MessageHandler) {
    if let Err(error) = stream.set_write_timeout(Some(WRITE_TIMEOUT)) {
        warn!(target: LISTENER_TARGET, %error, "failed to set write timeout");
    }
    let request = match read_request(&mut stream) {
        Ok(Some(request)) => request,
        Ok(None) => {
            debug!(target: LISTENER_TARGET, "client disconnected without request");
            return;
        }
        Err(error) => {
            warn!(target: LISTENER_TARGET, %error, "failed to read request");
            write_reply(&mut stream, ERROR_MARKER);
            return;
        }
    };
    let reply = handler.respond(&request);
    write_reply(&mut stream, &reply);
}

#[cfg(unix)]
fn write_reply(stream: &mut UnixStream, reply: &[u8]) {
    if let Err(error) = stream.write_all(reply).and_then(|()| stream.flush()) {
        warn!(target: LISTENER_TARGET, %error, "failed to write reply");
    }
}

/// Serves one datagram and sends the reply back to its sender.
pub(crate) fn serve_datagram(
    socket: &UdpSocket,
    peer: SocketAddr,
    request: &[u8],
    handler: &dyn MessageHandler,
) {
    let reply = fit_datagram(handler.respond(request), peer);
    if let Err(error) = socket.send_to(&reply, peer) {
        warn!(target: LISTENER_TARGET, %peer, %error, "failed to send reply");
    }
}

/// Replaces a reply too large for one datagram with the failure marker.
fn fit_datagram(reply: Vec<u8>, peer: SocketAddr) -> Vec<u8> {
    if reply.len() <= MAX_DATAGRAM_BYTES {
        return reply;
    }
    warn!(
        target: LISTENER_TARGET,
        %peer,
        size = reply.len(),
        "reply exceeds datagram size; sending failure marker"
    );
    ERROR_MARKER.to_vec()
}

/// Reads one request: until EOF, or until the peer goes quiet after sending
/// something.
///
/// Returns `Ok(None)` when the peer disconnects or stays silent without
/// sending anything.
#[cfg(unix)]
fn read_request(stream: &mut UnixStream) -> io::Result<Option<Vec<u8>>> {
    stream.set_read_timeout(Some(FIRST_BYTE_TIMEOUT))?;
    let mut buffer = Vec::new();
    let mut chunk = [0_u8; 4096];
    loop {
        match stream.read(&mut chunk) {
            Ok(0) => break,
            Ok(read) => {
                if buffer.is_empty() {
                    stream.set_read_timeout(Some(QUIET_PERIOD))?;
                }
                buffer.extend_from_slice(&chunk[..read]);
                enforce_request_limit(buffer.len())?;
            }
            Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
            Err(error) if is_timeout(&error) => break,
            Err(error) => return Err(error),
        }
    }
    Ok((!buffer.is_empty()).then_some(buffer))
}

#[cfg(unix)]
fn is_timeout(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}

#[cfg(unix)]
fn enforce_request_limit(size: usize) -> io::Result<()> {
    if size > MAX_REQUEST_BYTES {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("request exceeds {MAX_REQUEST_BYTES} byte limit"),
        ));
    }
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use std::net::Shutdown;
    use std::thread;

    use super::*;
    use crate::transport::EchoHandler;

    fn serve_pair() -> (UnixStream, thread::JoinHandle<()>) {
        let (client, server) = UnixStream::pair().expect("socket pair");
        let worker = thread::spawn(move || serve_stream(server, &EchoHandler));
        (client, worker)
    }

    fn read_reply(client: &mut UnixStream) -> Vec<u8> {
        let mut reply = Vec::new();
        client.read_to_end(&mut reply).expect("read reply");
        reply
    }

    #[test]
    fn half_closed_request_gets_one_reply() {
        let (mut client, worker) = serve_pair();
        client.write_all(b"@LST").expect("write request");
        client.shutdown(Shutdown::Write).expect("half close");
        assert_eq!(read_reply(&mut client), b"echo:@LST");
        worker.join().expect("join worker");
    }

    #[test]
    fn quiet_client_without_half_close_still_gets_reply() {
        let (mut client, worker) = serve_pair();
        client.write_all(b"@FND name").expect("write request");
        assert_eq!(read_reply(&mut client), b"echo:@FND name");
        worker.join().expect("join worker");
    }

    #[test]
    fn silent_disconnect_gets_no_reply() {
        let (mut client, worker) = serve_pair();
        client.shutdown(Shutdown::Write).expect("half close");
        assert!(read_reply(&mut client).is_empty());
        worker.join().expect("join worker");
    }

    #[test]
    fn oversized_request_gets_failure_marker() {
        let (mut client, worker) = serve_pair();
        let payload = vec![b'x'; MAX_REQUEST_BYTES + 1];
        let writer = thread::spawn(move || {
            let _ = client.write_all(&payload);
            let _ = client.shutdown(Shutdown::Write);
            client
        });
        worker.join().expect("join worker");
        let mut client = writer.join().expect("join writer");
        let mut reply = Vec::new();
        // Unread bytes may turn EOF into a reset once the marker is read.
        let _ = client.read_to_end(&mut reply);
        assert_eq!(reply, ERROR_MARKER);
    }
}
