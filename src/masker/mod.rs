//! Sensitive-data masking for captured HTTP dumps.
//!
//! Each stage redacts one category of secret from a dump text in place:
//!
//! - [`AuthMasker`]: the credential in the `Authorization` header.
//! - [`QueryMasker`]: named query-string parameters.
//! - [`JsonMasker`]: named JSON scalar fields.
//!
//! Stages are combined with [`MaskerChain`], which applies them in the order
//! they were added. A chain is built once and shared read-only between
//! concurrent exchanges.
//!
//! All stages share one length policy, see [`mask_secret`].
//!
//! Author: kelexine (<https://github.com/kelexine>)

mod auth;
mod json;
mod query;

pub use auth::AuthMasker;
pub use json::JsonMasker;
pub use query::QueryMasker;

use http::Request;
use std::sync::Arc;

/// Number of trailing characters left visible by default.
pub const DEFAULT_UNMASKED: usize = 7;

/// Character substituted for every hidden character of a secret.
pub const MASK_CHAR: char = '*';

/// A redaction stage. `request` is the head of the request the dump belongs
/// to; it is consulted for secrets that are not recoverable from the text.
pub trait Masker: Send + Sync {
    fn mask(&self, request: &Request<()>, dump: &mut String);
}

impl<M: Masker + ?Sized> Masker for Arc<M> {
    fn mask(&self, request: &Request<()>, dump: &mut String) {
        (**self).mask(request, dump)
    }
}

impl<M: Masker + ?Sized> Masker for Box<M> {
    fn mask(&self, request: &Request<()>, dump: &mut String) {
        (**self).mask(request, dump)
    }
}

/// Hides all but the last `unmasked` characters of `secret`.
///
/// The result has the same number of characters as the input. When
/// `unmasked` is at least the length of the secret, it is returned as is.
pub fn mask_secret(secret: &str, unmasked: usize) -> String {
    let hidden = secret.chars().count().saturating_sub(unmasked);

    let mut out = String::with_capacity(secret.len());
    out.extend(std::iter::repeat(MASK_CHAR).take(hidden));
    out.extend(secret.chars().skip(hidden));
    out
}

/// Ordered sequence of masking stages.
#[derive(Clone, Default)]
pub struct MaskerChain {
    stages: Vec<Arc<dyn Masker>>,
}

impl MaskerChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a stage; it runs after every stage added before it.
    pub fn with<M: Masker + 'static>(mut self, stage: M) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl Masker for MaskerChain {
    fn mask(&self, request: &Request<()>, dump: &mut String) {
        for stage in &self.stages {
            stage.mask(request, dump);
        }
    }
}

impl std::fmt::Debug for MaskerChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaskerChain")
            .field("stages", &self.stages.len())
            .finish()
    }
}
