// Retrying transport decorator
// Author: kelexine (https://github.com/kelexine)

use crate::context::{AttemptScope, CancelToken};
use crate::error::ExchangeError;
use crate::utils::logging::ErrorLog;
use backoff::backoff::{Backoff, Constant};
use bytes::Bytes;
use http::{Request, Response, StatusCode};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::Poll;
use std::time::Duration;
use tower::{BoxError, Layer, Service, ServiceExt};
use tracing::debug;

/// Attempt limit used when none is configured.
pub const DEFAULT_LIMIT: i64 = 10;

/// Pause between attempts used when none is configured.
pub const DEFAULT_PAUSE: Duration = Duration::from_secs(30);

/// Negative limits remove the attempt cap.
pub const FOREVER: i64 = -1;

/// Outcome of one attempt as seen by a validator.
pub type Outcome = Result<Response<Bytes>, BoxError>;

/// Returns `true` to accept an outcome, `false` to ask for another attempt.
pub type Validator = Arc<dyn Fn(&Outcome) -> bool + Send + Sync>;

/// Number of attempts a call issued, attached to successful responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempts(pub u64);

/// Default validator: retry on 502, 503 and 504; accept everything else,
/// transport errors included.
pub fn default_validator(outcome: &Outcome) -> bool {
    !matches!(
        outcome,
        Ok(res) if matches!(
            res.status(),
            StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT
        )
    )
}

/// Immutable retry configuration.
///
/// # Default Values
///
/// - `limit`: 10 attempts
/// - `pause`: 30 seconds
/// - `timeout`: none
/// - `cancel`: none
/// - `validator`: [`default_validator`]
#[derive(Clone)]
pub struct RetryPolicy {
    limit: i64,
    pause: Duration,
    timeout: Option<Duration>,
    cancel: Option<CancelToken>,
    validator: Validator,
    log: Option<Arc<dyn ErrorLog>>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            pause: DEFAULT_PAUSE,
            timeout: None,
            cancel: None,
            validator: Arc::new(default_validator),
            log: None,
        }
    }
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps the number of attempts. Negative values mean no cap.
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    /// Deadline applied to every attempt. Zero disables it.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout).filter(|t| !t.is_zero());
        self
    }

    /// Base token every attempt context derives from.
    pub fn cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&Outcome) -> bool + Send + Sync + 'static,
    {
        self.validator = Arc::new(validator);
        self
    }

    pub fn error_log<L: ErrorLog + 'static>(mut self, log: L) -> Self {
        self.log = Some(Arc::new(log));
        self
    }

    pub fn max_attempts(&self) -> u64 {
        u64::try_from(self.limit).unwrap_or(u64::MAX)
    }

    async fn wait(&self, backoff: &mut Constant) -> Result<(), ExchangeError> {
        let delay = backoff.next_backoff().unwrap_or(self.pause);
        match &self.cancel {
            Some(token) => tokio::select! {
                _ = tokio::time::sleep(delay) => Ok(()),
                _ = token.cancelled() => Err(ExchangeError::Cancelled),
            },
            None => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
        }
    }
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("limit", &self.limit)
            .field("pause", &self.pause)
            .field("timeout", &self.timeout)
            .field("cancel", &self.cancel.is_some())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct RetryLayer {
    policy: Arc<RetryPolicy>,
}

impl RetryLayer {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy: Arc::new(policy),
        }
    }
}

impl<S> Layer<S> for RetryLayer {
    type Service = RetryService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RetryService {
            inner,
            policy: self.policy.clone(),
            issued: Arc::new(AtomicU64::new(0)),
        }
    }
}

/// Transport wrapper produced by [`RetryLayer`].
///
/// Attempt counters live in each call, so one service (and its clones) can
/// drive concurrent requests. [`RetryService::attempts`] reports the count of
/// whichever call completed last.
#[derive(Debug, Clone)]
pub struct RetryService<S> {
    inner: S,
    policy: Arc<RetryPolicy>,
    issued: Arc<AtomicU64>,
}

impl<S> RetryService<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        RetryLayer::new(policy).layer(inner)
    }

    /// Attempts issued by the most recently completed call.
    pub fn attempts(&self) -> u64 {
        self.issued.load(Ordering::Acquire)
    }
}

impl<S> Service<Request<Bytes>> for RetryService<S>
where
    S: Service<Request<Bytes>, Response = Response<Bytes>> + Clone + Send + 'static,
    S::Error: Into<BoxError>,
    S::Future: Send + 'static,
{
    type Response = Response<Bytes>;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = Outcome> + Send>>;

    fn poll_ready(&mut self, cx: &mut std::task::Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(Into::into)
    }

    fn call(&mut self, req: Request<Bytes>) -> Self::Future {
        let inner = self.inner.clone();
        let inner = std::mem::replace(&mut self.inner, inner);
        let policy = self.policy.clone();
        let issued = self.issued.clone();

        Box::pin(async move {
            let max = policy.max_attempts();
            let mut backoff = Constant::new(policy.pause);
            let mut attempt: u64 = 1;
            let mut done: u64 = 0;
            let mut last: Option<Outcome> = None;

            while attempt <= max {
                if attempt > 1 {
                    if let Err(e) = policy.wait(&mut backoff).await {
                        issued.store(done, Ordering::Release);
                        return Err(e.into());
                    }
                }

                let outcome = send(inner.clone(), &policy, &req).await;
                if let (Err(e), Some(log)) = (&outcome, &policy.log) {
                    log.error(&e.to_string());
                }
                done += 1;

                if (policy.validator)(&outcome) {
                    issued.store(done, Ordering::Release);
                    return outcome.map(|mut res| {
                        res.extensions_mut().insert(Attempts(done));
                        res
                    });
                }

                debug!("Attempt {} of {} rejected by validator", attempt, max);
                last = Some(outcome);
                if attempt == max {
                    break;
                }
                attempt += 1;
            }

            issued.store(done, Ordering::Release);
            match last {
                Some(outcome) => outcome.map(|mut res| {
                    res.extensions_mut().insert(Attempts(done));
                    res
                }),
                None => Err(ExchangeError::NoAttempts.into()),
            }
        })
    }
}

/// Issues one attempt inside its own scope, which is released on return.
async fn send<S>(inner: S, policy: &RetryPolicy, req: &Request<Bytes>) -> Outcome
where
    S: Service<Request<Bytes>, Response = Response<Bytes>>,
    S::Error: Into<BoxError>,
{
    let scope = AttemptScope::new(policy.cancel.as_ref(), policy.timeout);

    let mut attempt = clone_request(req);
    attempt.extensions_mut().insert(scope.context().clone());

    match scope.run(inner.oneshot(attempt)).await {
        Ok(outcome) => outcome.map_err(Into::into),
        Err(e) => Err(e.into()),
    }
}

fn clone_request(req: &Request<Bytes>) -> Request<Bytes> {
    let mut clone = Request::new(req.body().clone());
    *clone.method_mut() = req.method().clone();
    *clone.uri_mut() = req.uri().clone();
    *clone.version_mut() = req.version();
    *clone.headers_mut() = req.headers().clone();
    *clone.extensions_mut() = req.extensions().clone();
    clone
}
