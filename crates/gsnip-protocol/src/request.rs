//! Request decoding and encoding.

use crate::errors::ProtocolError;
use crate::opcode::{Opcode, TOKEN_LEN};

/// A decoded client request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    operation: Opcode,
    body: Vec<u8>,
}

impl Request {
    /// Builds a request from its parts.
    #[must_use]
    pub fn new(operation: Opcode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            operation,
            body: body.into(),
        }
    }

    /// Decodes a raw client message.
    ///
    /// Surrounding ASCII whitespace is trimmed first. The first four bytes
    /// are the opcode token; when more bytes follow, the next byte must be a
    /// whitespace separator and everything after it is the body. Messages
    /// that break these rules decode to [`Opcode::Undefined`] with an empty
    /// body.
    #[must_use]
    pub fn decode(raw: &[u8]) -> Self {
        let message = raw.trim_ascii();
        let Some((token, rest)) = message.split_at_checked(TOKEN_LEN) else {
            return Self::undefined();
        };
        let operation = Opcode::from_token(token);
        if !operation.is_bound() {
            return Self::undefined();
        }
        match rest.split_first() {
            None => Self::new(operation, Vec::new()),
            Some((separator, body)) if separator.is_ascii_whitespace() => {
                Self::new(operation, body)
            }
            Some(_) => Self::undefined(),
        }
    }

    /// Encodes the request for the wire.
    ///
    /// An [`Opcode::Undefined`] request has no token and encodes to its body
    /// alone, which the daemon will reject.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let Some(token) = self.operation.token() else {
            return self.body.clone();
        };
        let mut encoded = Vec::with_capacity(TOKEN_LEN + 1 + self.body.len());
        encoded.extend_from_slice(token.as_bytes());
        if !self.body.is_empty() {
            encoded.push(b' ');
            encoded.extend_from_slice(&self.body);
        }
        encoded
    }

    /// Requested operation.
    #[must_use]
    pub const fn operation(&self) -> Opcode {
        self.operation
    }

    /// Raw request body.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Request body as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidUtf8`] when the body is not UTF-8.
    pub fn body_text(&self) -> Result<&str, ProtocolError> {
        std::str::from_utf8(&self.body).map_err(|source| ProtocolError::InvalidUtf8 {
            operation: self.operation.into(),
            source,
        })
    }

    fn undefined() -> Self {
        Self::new(Opcode::Undefined, Vec::new())
    }
}
