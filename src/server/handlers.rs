// HTTP request handlers
// Author: kelexine (https://github.com/kelexine)

use super::routes::AppState;
use crate::error::{ExchangeError, Result};
use axum::{
    body::Body,
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use http::header::{CONNECTION, HOST, TRANSFER_ENCODING};
use http::{HeaderMap, Request, Uri};
use serde::{Deserialize, Serialize};
use tower::{BoxError, Service, ServiceExt};
use tracing::debug;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub upstream: String,
    pub version: String,
}

pub async fn health_handler<S>(State(state): State<AppState<S>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        upstream: state.upstream,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Forwards any request to the upstream through the client stack.
pub async fn proxy_handler<S>(
    State(state): State<AppState<S>>,
    req: Request<Body>,
) -> Result<Response>
where
    S: Service<Request<Bytes>, Response = http::Response<Bytes>, Error = BoxError>
        + Clone
        + Send
        + Sync
        + 'static,
    S::Future: Send + 'static,
{
    let (parts, body) = req.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX)
        .await
        .map_err(|e| ExchangeError::Body(e.to_string()))?;

    let uri = upstream_uri(&state.upstream, &parts.uri)?;
    debug!("Proxying {} {}", parts.method, uri);

    let mut outbound = Request::builder()
        .method(parts.method)
        .uri(uri)
        .body(body)?;
    *outbound.headers_mut() = forwardable(parts.headers);

    let res = state
        .client
        .oneshot(outbound)
        .await
        .map_err(ExchangeError::from_boxed)?;

    let (mut parts, body) = res.into_parts();
    // The body is re-sent whole
    parts.headers.remove(TRANSFER_ENCODING);
    parts.headers.remove(CONNECTION);
    Ok(Response::from_parts(parts, Body::from(body)).into_response())
}

/// Joins the upstream base URL with the path and query of `uri`.
pub fn upstream_uri(base: &str, uri: &Uri) -> Result<Uri> {
    let path = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    let joined = format!("{}{}", base.trim_end_matches('/'), path);
    joined
        .parse::<Uri>()
        .map_err(|e| ExchangeError::InvalidRequest(e.into()))
}

/// Drops headers that describe the inbound connection rather than the message.
fn forwardable(mut headers: HeaderMap) -> HeaderMap {
    headers.remove(HOST);
    headers.remove(CONNECTION);
    headers.remove(TRANSFER_ENCODING);
    headers
}
