//! Request dispatch between the transport and the [`Manager`].
//!
//! Each payload is decoded into a [`gsnip_protocol::Request`]. Requests that
//! do not carry a known opcode are answered with the error marker and never
//! reach the manager. Reload requests affect the whole daemon rather than a
//! single client, so they bypass generic execution and call
//! [`Manager::reload`] directly.
//!
//! [`Manager`]: crate::manager::Manager
//! [`Manager::reload`]: crate::manager::Manager::reload

mod handler;

pub use self::handler::DispatchHandler;

pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");
