//! Client-side decorators for HTTP transports.
//!
//! Both decorators are `tower` layers over a buffered transport
//! (`Service<http::Request<Bytes>, Response = http::Response<Bytes>>`) and
//! compose in either order:
//!
//! ```text
//! caller → RetryLayer → DumpLayer → transport
//! ```
//!
//! With retry outside, every attempt produces its own dump message.
//!
//! Author: kelexine (<https://github.com/kelexine>)

mod dumper;
mod retry;

pub use dumper::{DumpLayer, DumpService};
pub use retry::{
    default_validator, Attempts, Outcome, RetryLayer, RetryPolicy, RetryService, Validator,
    DEFAULT_LIMIT, DEFAULT_PAUSE, FOREVER,
};

use crate::dump::Dumper;
use tower::ServiceBuilder;

/// Retry around dump around `transport`.
pub type Pipeline<T> = RetryService<DumpService<T>>;

/// Builds the standard client stack: each attempt is dumped, the whole
/// exchange is retried under `policy`.
pub fn pipeline<T>(transport: T, dumper: Dumper, policy: RetryPolicy) -> Pipeline<T> {
    ServiceBuilder::new()
        .layer(RetryLayer::new(policy))
        .layer(DumpLayer::new(dumper))
        .service(transport)
}
