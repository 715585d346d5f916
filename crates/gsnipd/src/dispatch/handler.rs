//! Message handler that routes decoded requests to the manager.

use std::sync::Arc;

use gsnip_protocol::{Opcode, Reply, Request};
use tracing::{debug, info, warn};

use crate::manager::Manager;
use crate::transport::MessageHandler;

use super::DISPATCH_TARGET;

/// Answers every transport payload with exactly one encoded reply.
#[derive(Debug, Clone)]
pub struct DispatchHandler {
    manager: Arc<Manager>,
}

impl DispatchHandler {
    /// Creates a handler serving requests from `manager`.
    #[must_use]
    pub const fn new(manager: Arc<Manager>) -> Self {
        Self { manager }
    }

    /// Produces the reply for a decoded request.
    #[must_use]
    pub fn dispatch(&self, request: &Request) -> Reply {
        match request.operation() {
            Opcode::Undefined => {
                warn!(target: DISPATCH_TARGET, "rejecting request without a known opcode");
                Reply::failure("unsupported request")
            }
            Opcode::Reload => self.reload(),
            operation => {
                debug!(
                    target: DISPATCH_TARGET,
                    %operation,
                    body_len = request.body().len(),
                    "dispatching request"
                );
                self.manager.execute(request)
            }
        }
    }

    fn reload(&self) -> Reply {
        match self.manager.reload() {
            Ok(()) => {
                info!(target: DISPATCH_TARGET, "snippets reloaded on request");
                Reply::success(Vec::new())
            }
            Err(error) => {
                warn!(target: DISPATCH_TARGET, %error, "requested reload failed");
                Reply::failure(error.to_string())
            }
        }
    }
}

impl MessageHandler for DispatchHandler {
    fn respond(&self, request: &[u8]) -> Vec<u8> {
        self.dispatch(&Request::decode(request)).encode()
    }
}
