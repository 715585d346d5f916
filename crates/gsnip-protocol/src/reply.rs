//! Reply encoding and decoding.

/// Payload written in place of the body when an operation fails.
pub const ERROR_MARKER: &[u8] = b"ERROR";

/// Result flag of an executed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The operation completed.
    Success,
    /// The operation failed; the body carries a diagnostic for logs only.
    Failure,
}

/// Reply produced for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    result: Outcome,
    body: Vec<u8>,
}

impl Reply {
    /// Builds a successful reply.
    #[must_use]
    pub fn success(body: impl Into<Vec<u8>>) -> Self {
        Self {
            result: Outcome::Success,
            body: body.into(),
        }
    }

    /// Builds a failed reply with a diagnostic body.
    #[must_use]
    pub fn failure(diagnostic: impl Into<Vec<u8>>) -> Self {
        Self {
            result: Outcome::Failure,
            body: diagnostic.into(),
        }
    }

    /// Result flag.
    #[must_use]
    pub const fn result(&self) -> Outcome {
        self.result
    }

    /// Returns true for successful replies.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.result, Outcome::Success)
    }

    /// Reply body: the payload on success, the diagnostic on failure.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Encodes the reply for the wire.
    ///
    /// Failures never leak their diagnostic; clients only see the marker.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        match self.result {
            Outcome::Success => self.body.clone(),
            Outcome::Failure => ERROR_MARKER.to_vec(),
        }
    }

    /// Interprets raw bytes received from the daemon.
    ///
    /// Only the bare marker is a failure; bodies that merely start with it
    /// are ordinary snippet text.
    #[must_use]
    pub fn decode(raw: &[u8]) -> Self {
        if raw == ERROR_MARKER {
            Self::failure(raw)
        } else {
            Self::success(raw)
        }
    }
}
