// Error types for httpdump middleware
// Author: kelexine (https://github.com/kelexine)

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("unsupported protocol scheme \"{0}\"")]
    UnsupportedScheme(String),

    #[error("dump error: {0}")]
    Dump(String),

    #[error("body error: {0}")]
    Body(String),

    #[error("attempt timed out after {0:?}")]
    Timeout(Duration),

    #[error("context canceled")]
    Cancelled,

    #[error("retry limit allows no attempts")]
    NoAttempts,

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] http::Error),

    #[error("Config parsing error: {0}")]
    ConfigParsing(#[from] config::ConfigError),
}

impl ExchangeError {
    /// Flattens a boxed tower error back into an `ExchangeError`, keeping the
    /// original variant when the box already holds one.
    pub fn from_boxed(err: tower::BoxError) -> Self {
        match err.downcast::<ExchangeError>() {
            Ok(err) => *err,
            Err(other) => ExchangeError::Upstream(other.to_string()),
        }
    }
}

// Convert ExchangeError to HTTP responses for Axum
impl IntoResponse for ExchangeError {
    fn into_response(self) -> Response {
        let (status, error_type) = match self {
            ExchangeError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "timeout_error"),
            ExchangeError::Cancelled => (StatusCode::SERVICE_UNAVAILABLE, "canceled_error"),
            ExchangeError::Upstream(_) | ExchangeError::Http(_) | ExchangeError::NoAttempts => {
                (StatusCode::BAD_GATEWAY, "upstream_error")
            }
            ExchangeError::InvalidRequest(_) | ExchangeError::UnsupportedScheme(_) => {
                (StatusCode::BAD_REQUEST, "invalid_request_error")
            }
            ExchangeError::Config(_) | ExchangeError::ConfigParsing(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "configuration_error")
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "api_error"),
        };

        let body = json!({
            "type": "error",
            "error": {
                "type": error_type,
                "message": self.to_string(),
            }
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ExchangeError>;
