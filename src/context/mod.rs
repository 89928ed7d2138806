//! Cancellation scopes carried by requests through the pipeline.
//!
//! A [`Context`] travels in the request extensions so transports and sinks can
//! observe cancellation and deadlines. The retry decorator derives a fresh
//! [`AttemptScope`] for every attempt; dropping the scope cancels it, so an
//! attempt's resources are released as soon as the attempt finishes.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use crate::error::ExchangeError;
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// A cloneable cancellation signal. Children observe their parent's
/// cancellation; cancelling a child never affects the parent.
#[derive(Clone, Debug)]
pub struct CancelToken {
    inner: Arc<TokenInner>,
}

#[derive(Debug)]
struct TokenInner {
    tx: watch::Sender<bool>,
    parent: Option<CancelToken>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        Self::with_parent(None)
    }

    fn with_parent(parent: Option<CancelToken>) -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            inner: Arc::new(TokenInner { tx, parent }),
        }
    }

    /// Creates a token cancelled together with `self`.
    pub fn child(&self) -> Self {
        Self::with_parent(Some(self.clone()))
    }

    pub fn cancel(&self) {
        self.inner.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.inner.tx.borrow()
            || self
                .inner
                .parent
                .as_ref()
                .is_some_and(CancelToken::is_cancelled)
    }

    /// Resolves once this token or any ancestor is cancelled.
    pub fn cancelled(&self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            let mut rx = self.inner.tx.subscribe();
            match &self.inner.parent {
                Some(parent) => {
                    tokio::select! {
                        _ = rx.wait_for(|cancelled| *cancelled) => {}
                        _ = parent.cancelled() => {}
                    }
                }
                None => {
                    let _ = rx.wait_for(|cancelled| *cancelled).await;
                }
            }
        })
    }
}

/// Request-scoped cancellation and deadline, readable by transports and sinks.
#[derive(Clone, Debug, Default)]
pub struct Context {
    token: CancelToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never cancelled unless explicitly told to.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn token(&self) -> &CancelToken {
        &self.token
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_done(&self) -> bool {
        self.token.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// How an attempt's context relates to the configured base token and timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextKind {
    Background,
    BackgroundWithTimeout(Duration),
    BaseWithCancel,
    BaseWithTimeout(Duration),
}

impl ContextKind {
    /// Picks the derivation rule. A zero timeout means "no timeout".
    pub fn derive(has_base: bool, timeout: Option<Duration>) -> Self {
        match (has_base, timeout.filter(|t| !t.is_zero())) {
            (false, None) => ContextKind::Background,
            (false, Some(t)) => ContextKind::BackgroundWithTimeout(t),
            (true, None) => ContextKind::BaseWithCancel,
            (true, Some(t)) => ContextKind::BaseWithTimeout(t),
        }
    }

    fn timeout(self) -> Option<Duration> {
        match self {
            ContextKind::BackgroundWithTimeout(t) | ContextKind::BaseWithTimeout(t) => Some(t),
            _ => None,
        }
    }
}

/// Context for a single attempt. Cancelled on drop.
#[derive(Debug)]
pub struct AttemptScope {
    kind: ContextKind,
    context: Context,
}

impl AttemptScope {
    pub fn new(base: Option<&CancelToken>, timeout: Option<Duration>) -> Self {
        let kind = ContextKind::derive(base.is_some(), timeout);
        let token = match base {
            Some(base) => base.child(),
            None => CancelToken::new(),
        };
        let deadline = kind.timeout().map(|t| Instant::now() + t);

        Self {
            kind,
            context: Context { token, deadline },
        }
    }

    pub fn kind(&self) -> ContextKind {
        self.kind
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Drives `fut` until it completes, the scope is cancelled or the deadline
    /// passes, whichever comes first.
    pub async fn run<F>(&self, fut: F) -> Result<F::Output, ExchangeError>
    where
        F: Future,
    {
        let deadline = async {
            match self.context.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            out = fut => Ok(out),
            _ = self.context.token.cancelled() => Err(ExchangeError::Cancelled),
            _ = deadline => Err(ExchangeError::Timeout(self.kind.timeout().unwrap_or_default())),
        }
    }
}

impl Drop for AttemptScope {
    fn drop(&mut self) {
        self.context.token.cancel();
    }
}
