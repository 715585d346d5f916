//! Wire protocol shared by the gsnip daemon and its clients.
//!
//! A request is a four byte opcode token optionally followed by a single
//! separator and a body:
//!
//! ```text
//! @FND shebang
//! @LST
//! @INS startsnip shebang "python shebang"
//! #!/usr/bin/env python3
//! endsnip
//! ```
//!
//! A reply is either the raw result body or the fixed [`ERROR_MARKER`].

mod errors;
mod opcode;
mod reply;
mod request;

pub use errors::ProtocolError;
pub use opcode::Opcode;
pub use reply::{ERROR_MARKER, Outcome, Reply};
pub use request::Request;
