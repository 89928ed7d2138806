// Server-side traffic dumping middleware
// Author: kelexine (https://github.com/kelexine)

use super::capture::ResponseCapture;
use crate::context::Context;
use crate::dump::{request_head, response_head, Dumper};
use axum::body::{Body, HttpBody};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use http::{Request, StatusCode};
use http_body_util::{BodyExt, LengthLimitError};
use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::Poll;
use tower::{BoxError, Layer, Service, ServiceExt};

/// Layer dumping every exchange handled by the wrapped service.
///
/// Request and response bodies are buffered so they can be dumped; the
/// handler and the client still see the full bodies.
///
/// # Example
///
/// ```rust,ignore
/// use httpdump::server::DumpLayer;
///
/// let app = Router::new()
///     .route("/", get(handler))
///     .layer(DumpLayer::new(Dumper::new(DebugFlusher)));
/// ```
#[derive(Debug, Clone)]
pub struct DumpLayer {
    dumper: Arc<Dumper>,
}

impl DumpLayer {
    pub fn new(dumper: Dumper) -> Self {
        Self {
            dumper: Arc::new(dumper),
        }
    }
}

impl<S> Layer<S> for DumpLayer {
    type Service = DumpService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        DumpService {
            inner,
            dumper: self.dumper.clone(),
        }
    }
}

/// Handler wrapper produced by [`DumpLayer`].
#[derive(Debug, Clone)]
pub struct DumpService<S> {
    inner: S,
    dumper: Arc<Dumper>,
}

impl<S, B> Service<Request<B>> for DumpService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Error: Display + Send + 'static,
    S::Future: Send + 'static,
    B: HttpBody<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError> + Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut std::task::Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        let inner = self.inner.clone();
        let inner = std::mem::replace(&mut self.inner, inner);
        let dumper = self.dumper.clone();

        Box::pin(async move {
            let ctx = req
                .extensions()
                .get::<Context>()
                .cloned()
                .unwrap_or_default();

            let (parts, body) = req.into_parts();
            // The handler never runs on a partial body
            let bytes = match body.collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(e) => {
                    let e: BoxError = e.into();
                    let request_dump = dumper.failed("request", &e);
                    dumper.deliver(&ctx, &request_dump, &e.to_string());
                    return Ok(unreadable_body(&e));
                }
            };
            let req = Request::from_parts(parts, Body::from(bytes.clone()));
            let head = request_head(&req);
            let request_dump = dumper.inbound_request(&head, &bytes);

            let res = match inner.oneshot(req).await {
                Ok(res) => res,
                Err(e) => {
                    dumper.deliver(&ctx, &request_dump, &e.to_string());
                    return Err(e);
                }
            };

            let (parts, mut body) = res.into_parts();
            let mut capture = ResponseCapture::from_head(parts.status, parts.headers);
            let mut broken = None;
            while let Some(frame) = body.frame().await {
                match frame {
                    Ok(frame) => {
                        if let Ok(data) = frame.into_data() {
                            capture.write(data);
                        }
                    }
                    Err(e) => {
                        broken = Some(e);
                        break;
                    }
                }
            }

            let response_dump = match broken {
                Some(e) => dumper.failed("response", e),
                None => {
                    // The capture has no protocol version of its own
                    let captured = capture.result(head.version());
                    dumper.response(&head, &response_head(&captured), captured.body())
                }
            };
            dumper.deliver(&ctx, &request_dump, &response_dump);

            let mut res = capture.into_response();
            *res.version_mut() = parts.version;
            *res.extensions_mut() = parts.extensions;
            Ok(res)
        })
    }
}

/// Rejects a request whose body could not be read in full.
fn unreadable_body(err: &BoxError) -> Response {
    let status = if exceeds_limit(err) {
        StatusCode::PAYLOAD_TOO_LARGE
    } else {
        StatusCode::BAD_REQUEST
    };
    (status, err.to_string()).into_response()
}

fn exceeds_limit(err: &BoxError) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err.as_ref());
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}
