// reqwest-backed transport
// Author: kelexine (https://github.com/kelexine)

use crate::config::UpstreamConfig;
use crate::context::Context;
use crate::error::{ExchangeError, Result};
use bytes::Bytes;
use http::{Request, Response};
use std::future::Future;
use std::pin::Pin;
use std::task::Poll;
use std::time::Duration;
use tower::Service;
use tracing::debug;

/// Buffered HTTP transport over a shared `reqwest::Client`.
///
/// Honors a [`Context`] found in the request extensions: the exchange is
/// abandoned once the context is cancelled.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Configure an HTTP client with connection pooling and keep-alive.
    pub fn from_config(config: &UpstreamConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .tcp_keepalive(Some(Duration::from_secs(60)))
            .tcp_nodelay(true)
            .use_rustls_tls()
            .build()?;

        debug!("Created HTTP client with connection pooling and keep-alive");
        Ok(Self { client })
    }

    async fn execute(client: reqwest::Client, req: Request<Bytes>) -> Result<Response<Bytes>> {
        let request = reqwest::Request::try_from(req)?;
        let response = client.execute(request).await?;

        let mut builder = Response::builder()
            .status(response.status())
            .version(response.version());
        if let Some(headers) = builder.headers_mut() {
            headers.extend(
                response
                    .headers()
                    .iter()
                    .map(|(name, value)| (name.clone(), value.clone())),
            );
        }
        let body = response.bytes().await?;

        Ok(builder.body(body)?)
    }
}

impl Service<Request<Bytes>> for ReqwestTransport {
    type Response = Response<Bytes>;
    type Error = ExchangeError;
    type Future = Pin<Box<dyn Future<Output = Result<Response<Bytes>>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut std::task::Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Bytes>) -> Self::Future {
        let client = self.client.clone();
        let ctx = req.extensions().get::<Context>().cloned();

        Box::pin(async move {
            match ctx {
                Some(ctx) => {
                    tokio::select! {
                        res = Self::execute(client, req) => res,
                        _ = ctx.token().cancelled() => Err(ExchangeError::Cancelled),
                    }
                }
                None => Self::execute(client, req).await,
            }
        })
    }
}
