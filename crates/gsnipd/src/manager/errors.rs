//! Error types for command execution.

use gsnip_protocol::{Opcode, ProtocolError};
use thiserror::Error;

use crate::backing_file::FileError;
use crate::container::ContainerError;
use crate::parser::ParseError;

/// Errors surfaced while executing a request or reloading state.
#[derive(Debug, Error)]
pub enum ManagerError {
    /// Snippet text could not be parsed.
    #[error("failed to parse snippets: {0}")]
    Parse(#[from] ParseError),

    /// The container refused the operation.
    #[error(transparent)]
    Container(#[from] ContainerError),

    /// The backing file could not be read or written.
    #[error(transparent)]
    File(#[from] FileError),

    /// The request body was not valid UTF-8.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// An insert request carried no snippet blocks.
    #[error("insert request contained no snippets")]
    EmptyInsert,

    /// The opcode has no executable meaning.
    #[error("unsupported request: {opcode}")]
    Unsupported {
        /// Opcode that was rejected.
        opcode: Opcode,
    },

    /// A manager lock was poisoned by a panicking thread.
    #[error("internal error: {what} lock poisoned")]
    Poisoned {
        /// Which lock failed.
        what: &'static str,
    },
}
