// Debug-level tracing sink
// Author: kelexine (https://github.com/kelexine)

use super::Flusher;
use crate::context::Context;
use tracing::debug;

/// Sends every dump message to the `tracing` debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct DebugFlusher;

impl DebugFlusher {
    pub fn new() -> Self {
        Self
    }
}

impl Flusher for DebugFlusher {
    fn flush(&self, _ctx: &Context, message: &str) {
        debug!(target: "httpdump", "{}", message);
    }
}
