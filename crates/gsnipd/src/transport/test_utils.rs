//! Test helpers for the transport module.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use super::MessageHandler;

/// Counts requests and answers each with an empty reply.
pub(crate) struct CountingHandler {
    count: Arc<AtomicUsize>,
}

impl CountingHandler {
    pub(crate) fn new() -> (Arc<AtomicUsize>, Arc<Self>) {
        let count = Arc::new(AtomicUsize::new(0));
        let handler = Arc::new(Self {
            count: Arc::clone(&count),
        });
        (count, handler)
    }
}

impl MessageHandler for CountingHandler {
    fn respond(&self, _request: &[u8]) -> Vec<u8> {
        self.count.fetch_add(1, Ordering::SeqCst);
        Vec::new()
    }
}

/// Replies with the request prefixed by `echo:`.
pub(crate) struct EchoHandler;

impl MessageHandler for EchoHandler {
    fn respond(&self, request: &[u8]) -> Vec<u8> {
        let mut reply = b"echo:".to_vec();
        reply.extend_from_slice(request);
        reply
    }
}
