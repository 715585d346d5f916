//! Error types for snippet parsing.

use std::io;

use thiserror::Error;

/// Errors surfaced by a parser run. Any of them aborts the whole run.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The input held no snippet blocks at all.
    #[error("nothing to parse")]
    Empty,
    /// A signature line was malformed.
    #[error("line {number} contains an error: {line}")]
    Line {
        /// 1-based line number.
        number: usize,
        /// The offending line, verbatim.
        line: String,
    },
    /// Input ended before the open block was closed with `endsnip`.
    #[error("snippet '{name}' opened on line {opened_at} is missing its endsnip line")]
    Truncated {
        /// Name of the unterminated snippet.
        name: String,
        /// 1-based line number of its signature.
        opened_at: usize,
    },
    /// Reading the underlying input failed.
    #[error("failed to read snippet input: {source}")]
    Read {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

impl ParseError {
    /// Returns true when the input simply held no snippets.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}
