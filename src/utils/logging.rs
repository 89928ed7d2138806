//! Structured logging setup and the diagnostic logger used by the decorators.
//!
//! This module configures the `tracing` ecosystem for the binary and defines
//! [`ErrorLog`], the sink for non-fatal pipeline diagnostics such as dump
//! failures or transport errors seen between retries.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use crate::config::LoggingConfig;
use crate::error::Result;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initializes the global tracing subscriber for the application.
///
/// Supports three output formats:
/// - `json`: Structured JSON logs for production ingestion.
/// - `compact`: Single-line human-readable output.
/// - `pretty` (default): Multi-line, colorized output for development.
///
/// Log levels are controlled via the `RUST_LOG` environment variable or
/// the provided `LoggingConfig`. Dump messages from [`crate::storage::DebugFlusher`]
/// are only visible at `debug` level or below.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        "compact" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().compact())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}

/// Receives diagnostics the pipeline recovers from on its own.
pub trait ErrorLog: Send + Sync {
    fn error(&self, message: &str);
}

impl<L: ErrorLog + ?Sized> ErrorLog for Arc<L> {
    fn error(&self, message: &str) {
        (**self).error(message)
    }
}

/// Forwards diagnostics to `tracing` at error level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingErrorLog;

impl ErrorLog for TracingErrorLog {
    fn error(&self, message: &str) {
        tracing::error!(target: "httpdump", "{}", message);
    }
}
