//! Errors raised while interpreting protocol payloads.

use std::str::Utf8Error;

use thiserror::Error;

/// Errors surfaced while reading a request body.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The body of the named operation was not valid UTF-8.
    #[error("{operation} request body is not valid UTF-8: {source}")]
    InvalidUtf8 {
        /// Opcode token of the offending request.
        operation: &'static str,
        /// Underlying decoding error.
        #[source]
        source: Utf8Error,
    },
}
