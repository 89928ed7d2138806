// httpdump - HTTP traffic dumping with secret masking and retries
// Author: kelexine (https://github.com/kelexine)

pub mod cli;
pub mod client;
pub mod config;
pub mod context;
pub mod dump;
pub mod error;
pub mod masker;
pub mod server;
pub mod storage;
pub mod transport;
pub mod utils;

use config::AppConfig;
use dump::Dumper;
use storage::Flusher;
use utils::logging::TracingErrorLog;

/// Dumper configured from `config`: masker chain, template and body policy,
/// with failures reported through `tracing`.
pub fn dumper_from_config<F: Flusher + 'static>(config: &AppConfig, flusher: F) -> Dumper {
    let mut builder = Dumper::builder(flusher)
        .masker(config.masker.chain())
        .error_log(TracingErrorLog)
        .template(config.dump.template());
    if config.dump.capture_all_bodies {
        builder = builder.filter(|_| true);
    }
    builder.build()
}
