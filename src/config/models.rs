//! Configuration data structures for httpdump.
//!
//! Every section has defaults, so an empty file (or no file at all) yields a
//! working configuration.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use crate::client::{RetryPolicy, DEFAULT_LIMIT, DEFAULT_PAUSE};
use crate::dump::{Template, DEFAULT_TEMPLATE};
use crate::masker::{AuthMasker, JsonMasker, MaskerChain, QueryMasker, DEFAULT_UNMASKED};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The root configuration object for the application.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Dumping reverse proxy listener.
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream the proxy forwards to, and client transport settings.
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Dump message formatting.
    #[serde(default)]
    pub dump: DumpConfig,

    /// Which secrets get masked in dumps.
    #[serde(default)]
    pub masker: MaskerConfig,

    /// Retry behavior of the client pipeline.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Logging and observability settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Settings for the built-in HTTP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Default: `127.0.0.1`
    #[serde(default = "default_host")]
    pub host: String,

    /// Default: `8080`
    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum accepted request body in bytes.
    /// Default: `10485760` (10 MiB)
    #[serde(default = "default_body_limit")]
    pub body_limit: usize,
}

/// Settings for the outbound HTTP client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL requests are forwarded to.
    /// Default: `http://127.0.0.1:9000`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Whole-request timeout in seconds.
    /// Default: `300`
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Default: `10`
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,

    /// Default: `10`
    #[serde(default = "default_pool_idle")]
    pub pool_max_idle_per_host: usize,
}

/// Settings for dump messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DumpConfig {
    /// Two-slot template; `%s` for the request, `%s` for the response.
    #[serde(default = "default_template")]
    pub template: String,

    /// Capture bodies of every content type, binary streams included.
    /// Default: `false`
    #[serde(default)]
    pub capture_all_bodies: bool,
}

/// Settings for the masker chain. Stages run in the order auth, query, json.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaskerConfig {
    /// Mask the `Authorization` credential. Default: `true`
    #[serde(default = "default_true")]
    pub auth: bool,

    #[serde(default = "default_unmasked")]
    pub auth_unmasked: usize,

    /// Query parameters to mask. Default: none
    #[serde(default)]
    pub query_params: Vec<String>,

    #[serde(default = "default_unmasked")]
    pub query_unmasked: usize,

    /// JSON fields to mask. Default: none
    #[serde(default)]
    pub json_fields: Vec<String>,

    #[serde(default = "default_unmasked")]
    pub json_unmasked: usize,
}

/// Settings for the retry decorator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum attempts; negative for unlimited. Default: `10`
    #[serde(default = "default_limit")]
    pub limit: i64,

    /// Pause between attempts in milliseconds. Default: `30000`
    #[serde(default = "default_pause_ms")]
    pub pause_ms: u64,

    /// Per-attempt timeout in milliseconds; `0` disables it. Default: `0`
    #[serde(default)]
    pub timeout_ms: u64,
}

/// Settings for application logging and output format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum log level (`trace`, `debug`, `info`, `warn`, `error`).
    /// Default: `debug`, so dumps are visible.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format for logs (`pretty`, `json`, `compact`).
    /// Default: `pretty`
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl MaskerConfig {
    /// Builds the chain described by this section.
    pub fn chain(&self) -> MaskerChain {
        let mut chain = MaskerChain::new();
        if self.auth {
            chain = chain.with(AuthMasker::new().with_unmasked(self.auth_unmasked));
        }
        if !self.query_params.is_empty() {
            chain = chain.with(
                QueryMasker::new(self.query_params.iter().cloned())
                    .with_unmasked(self.query_unmasked),
            );
        }
        if !self.json_fields.is_empty() {
            chain = chain.with(
                JsonMasker::new(self.json_fields.iter().cloned())
                    .with_unmasked(self.json_unmasked),
            );
        }
        chain
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new()
            .limit(self.limit)
            .pause(Duration::from_millis(self.pause_ms))
            .timeout(Duration::from_millis(self.timeout_ms))
    }
}

impl DumpConfig {
    pub fn template(&self) -> Template {
        Template::new(self.template.clone())
    }
}

// Default trait implementations linking to custom logic

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit: default_body_limit(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
            connect_timeout_seconds: default_connect_timeout(),
            pool_max_idle_per_host: default_pool_idle(),
        }
    }
}

impl Default for DumpConfig {
    fn default() -> Self {
        Self {
            template: default_template(),
            capture_all_bodies: false,
        }
    }
}

impl Default for MaskerConfig {
    fn default() -> Self {
        Self {
            auth: true,
            auth_unmasked: default_unmasked(),
            query_params: Vec::new(),
            query_unmasked: default_unmasked(),
            json_fields: Vec::new(),
            json_unmasked: default_unmasked(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            pause_ms: default_pause_ms(),
            timeout_ms: 0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Helper functions for serde defaults
fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_body_limit() -> usize {
    10 * 1024 * 1024
}

fn default_base_url() -> String {
    "http://127.0.0.1:9000".to_string()
}

fn default_timeout() -> u64 {
    300
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_pool_idle() -> usize {
    10
}

fn default_template() -> String {
    DEFAULT_TEMPLATE.to_string()
}

fn default_true() -> bool {
    true
}

fn default_unmasked() -> usize {
    DEFAULT_UNMASKED
}

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

fn default_pause_ms() -> u64 {
    DEFAULT_PAUSE.as_millis() as u64
}

fn default_log_level() -> String {
    "debug".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}
