//! Operation tokens understood by the daemon.

use strum::{Display, EnumIter, IntoStaticStr};

/// Length in bytes of every opcode token on the wire.
pub(crate) const TOKEN_LEN: usize = 4;

/// Operations a client may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr)]
pub enum Opcode {
    /// Look up a snippet body by name (`@FND`).
    #[strum(serialize = "@FND")]
    Find,
    /// List snippet names and descriptions (`@LST`).
    #[strum(serialize = "@LST")]
    List,
    /// Insert one or more serialised snippets (`@INS`).
    #[strum(serialize = "@INS")]
    Insert,
    /// Delete a snippet by name (`@DEL`).
    #[strum(serialize = "@DEL")]
    Delete,
    /// Re-read the snippet source file (`@RLD`).
    #[strum(serialize = "@RLD")]
    Reload,
    /// Anything the decoder did not recognise. Never dispatched.
    #[strum(serialize = "@UND")]
    Undefined,
}

impl Opcode {
    /// Resolves a wire token, returning [`Opcode::Undefined`] when unknown.
    #[must_use]
    pub fn from_token(token: &[u8]) -> Self {
        match token {
            b"@FND" => Self::Find,
            b"@LST" => Self::List,
            b"@INS" => Self::Insert,
            b"@DEL" => Self::Delete,
            b"@RLD" => Self::Reload,
            _ => Self::Undefined,
        }
    }

    /// Returns the wire token, or `None` for [`Opcode::Undefined`].
    #[must_use]
    pub fn token(self) -> Option<&'static str> {
        match self {
            Self::Undefined => None,
            other => Some(other.into()),
        }
    }

    /// Returns true when the opcode names a real operation.
    #[must_use]
    pub const fn is_bound(self) -> bool {
        !matches!(self, Self::Undefined)
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn every_bound_token_resolves_to_itself() {
        for opcode in Opcode::iter().filter(|opcode| opcode.is_bound()) {
            let token = opcode.token().expect("bound opcode has a token");
            assert_eq!(token.len(), TOKEN_LEN);
            assert_eq!(Opcode::from_token(token.as_bytes()), opcode);
        }
    }

    #[test]
    fn undefined_has_no_wire_token() {
        assert_eq!(Opcode::Undefined.token(), None);
        assert_eq!(Opcode::from_token(b"@UND"), Opcode::Undefined);
    }
}
