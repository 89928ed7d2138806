// Client-side traffic dumping decorator
// Author: kelexine (https://github.com/kelexine)

use crate::context::Context;
use crate::dump::{request_head, response_head, Dumper};
use bytes::Bytes;
use http::{Request, Response};
use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::Poll;
use tower::{Layer, Service, ServiceExt};

/// Layer dumping every exchange of the wrapped transport.
///
/// # Example
///
/// ```rust,ignore
/// use httpdump::client::DumpLayer;
/// use httpdump::dump::Dumper;
/// use httpdump::storage::DebugFlusher;
/// use tower::ServiceBuilder;
///
/// let transport = ServiceBuilder::new()
///     .layer(DumpLayer::new(Dumper::new(DebugFlusher)))
///     .service(ReqwestTransport::new(reqwest::Client::new()));
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

/// Transport wrapper produced by [`DumpLayer`].
#[derive(Debug, Clone)]
pub struct DumpService<S> {
    inner: S,
    dumper: Arc<Dumper>,
}

impl<S> DumpService<S> {
    pub fn new(inner: S, dumper: Dumper) -> Self {
        Self {
            inner,
            dumper: Arc::new(dumper),
        }
    }
}

impl<S> Service<Request<Bytes>> for DumpService<S>
where
    S: Service<Request<Bytes>, Response = Response<Bytes>> + Clone + Send + 'static,
    S::Error: Display + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response<Bytes>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response<Bytes>, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut std::task::Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Bytes>) -> Self::Future {
        // Keep the service that was polled ready for this call
        let inner = self.inner.clone();
        let inner = std::mem::replace(&mut self.inner, inner);
        let dumper = self.dumper.clone();

        Box::pin(async move {
            let ctx = req
                .extensions()
                .get::<Context>()
                .cloned()
                .unwrap_or_default();
            let head = request_head(&req);
            let request_dump = dumper.outbound_request(&head, req.body());

            let res = match inner.oneshot(req).await {
                Ok(res) => res,
                Err(e) => {
                    dumper.deliver(&ctx, &request_dump, &e.to_string());
                    return Err(e);
                }
            };

            let response_dump = dumper.response(&head, &response_head(&res), res.body());
            dumper.deliver(&ctx, &request_dump, &response_dump);

            Ok(res)
        })
    }
}
