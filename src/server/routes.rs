// HTTP routes configuration
// Author: kelexine (https://github.com/kelexine)

use super::dumper::DumpLayer;
use super::handlers::{health_handler, proxy_handler};
use crate::config::AppConfig;
use crate::dump::Dumper;
use axum::{routing::get, Router};
use bytes::Bytes;
use http::{Request, Response};
use tower::{BoxError, Service};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState<S> {
    /// Base URL every proxied path is appended to.
    pub upstream: String,
    /// Outbound client stack, usually [`crate::client::Pipeline`].
    pub client: S,
}

/// Builds the dumping reverse proxy.
///
/// Inbound exchanges are dumped by `dumper`; whatever dumping `client` does
/// for the upstream side is up to the caller.
pub fn create_router<S>(config: &AppConfig, dumper: Dumper, client: S) -> Router
where
    S: Service<Request<Bytes>, Response = Response<Bytes>, Error = BoxError>
        + Clone
        + Send
        + Sync
        + 'static,
    S::Future: Send + 'static,
{
    let state = AppState {
        upstream: config.upstream.base_url.clone(),
        client,
    };

    let (set_request_id, propagate_request_id) = request_id_layers();

    Router::new()
        .route("/health", get(health_handler::<S>))
        .fallback(proxy_handler::<S>)
        .layer(DumpLayer::new(dumper))
        .layer(RequestBodyLimitLayer::new(config.server.body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(propagate_request_id)
        .layer(set_request_id)
        .with_state(state)
}

fn request_id_layers() -> (SetRequestIdLayer<MakeRequestUuid>, PropagateRequestIdLayer) {
    (
        SetRequestIdLayer::x_request_id(MakeRequestUuid),
        PropagateRequestIdLayer::x_request_id(),
    )
}
