//! Server-side dumping and the dumping reverse proxy.
//!
//! [`DumpLayer`] wraps any axum/tower handler stack and dumps each inbound
//! exchange. The response is reconstructed through a [`ResponseCapture`],
//! which records what the handler wrote while forwarding it unchanged.
//!
//! [`create_router`] assembles the `serve` command's proxy: every path except
//! `/health` is forwarded upstream through the client pipeline.
//!
//! Author: kelexine (<https://github.com/kelexine>)

mod capture;
mod dumper;
mod handlers;
mod routes;

pub use capture::ResponseCapture;
pub use dumper::{DumpLayer, DumpService};
pub use handlers::{upstream_uri, HealthResponse};
pub use routes::{create_router, AppState};
