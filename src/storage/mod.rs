//! Destinations for finished dump messages.
//!
//! A [`Flusher`] receives one rendered message per exchange. Delivery is
//! fire-and-forget: the pipeline never observes a result.
//!
//! Author: kelexine (<https://github.com/kelexine>)

mod debug;
mod memory;

pub use debug::DebugFlusher;
pub use memory::MemoryFlusher;

use crate::context::Context;
use std::sync::Arc;

pub trait Flusher: Send + Sync {
    fn flush(&self, ctx: &Context, message: &str);
}

impl<F: Flusher + ?Sized> Flusher for Arc<F> {
    fn flush(&self, ctx: &Context, message: &str) {
        (**self).flush(ctx, message)
    }
}
