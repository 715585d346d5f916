//! Socket listener for the daemon endpoint.
//!
//! The listener binds either a Unix stream socket or a UDP socket and serves
//! one request per connection (or datagram) on a background thread. What a
//! request means is left to a [`MessageHandler`].

mod errors;
mod handler;
mod listener;
#[cfg(test)]
mod test_utils;

pub use self::errors::ListenerError;
pub use self::handler::MessageHandler;
pub use self::listener::{ListenerHandle, SocketListener};
#[cfg(test)]
pub(crate) use self::test_utils::{CountingHandler, EchoHandler};

const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
