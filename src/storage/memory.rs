// In-memory sink
// Author: kelexine (https://github.com/kelexine)

use super::Flusher;
use crate::context::Context;
use parking_lot::Mutex;
use std::sync::Arc;

/// Collects dump messages in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemoryFlusher {
    messages: Arc<Mutex<Vec<String>>>,
}

impl MemoryFlusher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.lock().is_empty()
    }

    /// Removes and returns everything collected so far.
    pub fn drain(&self) -> Vec<String> {
        std::mem::take(&mut *self.messages.lock())
    }
}

impl Flusher for MemoryFlusher {
    fn flush(&self, _ctx: &Context, message: &str) {
        self.messages.lock().push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_buffer() {
        let flusher = MemoryFlusher::new();
        let clone = flusher.clone();
        clone.flush(&Context::background(), "one");
        flusher.flush(&Context::background(), "two");

        assert_eq!(flusher.messages(), vec!["one", "two"]);
        assert_eq!(clone.drain().len(), 2);
        assert!(flusher.is_empty());
    }
}
