// httpdump - HTTP traffic dumping with secret masking and retries
// Author: kelexine (https://github.com/kelexine)

use anyhow::{anyhow, Context as _, Result};
use bytes::Bytes;
use clap::Parser;
use httpdump::cli::{parse_header, Args, Command};
use httpdump::client::{pipeline, Attempts};
use httpdump::config::AppConfig;
use httpdump::context::CancelToken;
use httpdump::dumper_from_config;
use httpdump::server::create_router;
use httpdump::storage::DebugFlusher;
use httpdump::transport::ReqwestTransport;
use httpdump::utils::logging::{self, TracingErrorLog};
use std::net::SocketAddr;
use tokio::signal;
use tower::ServiceExt;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Phase 1: Load configuration
    let mut config = AppConfig::load(args.config.as_deref())?;

    // Phase 2: Initialize logging
    logging::init(&config.logging)?;
    info!("Starting httpdump v{}", env!("CARGO_PKG_VERSION"));

    // Cancelled on shutdown; aborts pending retry pauses and attempts
    let shutdown = CancelToken::new();

    match args.command {
        Command::Serve { upstream, port } => {
            if let Some(upstream) = upstream {
                config.upstream.base_url = upstream;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            serve(config, shutdown).await
        }
        Command::Fetch {
            url,
            method,
            headers,
            data,
        } => fetch(config, shutdown, url, method, headers, data).await,
    }
}

async fn serve(config: AppConfig, shutdown: CancelToken) -> Result<()> {
    // Phase 3: Build the upstream client stack
    let transport = ReqwestTransport::from_config(&config.upstream)?;
    let policy = config
        .retry
        .policy()
        .cancel(shutdown.clone())
        .error_log(TracingErrorLog);
    let client = pipeline(
        transport,
        dumper_from_config(&config, DebugFlusher),
        policy,
    );

    // Phase 4: Build and start HTTP server
    let app = create_router(&config, dumper_from_config(&config, DebugFlusher), client);
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    info!(
        "Proxying {} -> {}",
        addr, config.upstream.base_url
    );
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Phase 5: Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    info!("Server shut down gracefully");
    Ok(())
}

async fn fetch(
    config: AppConfig,
    shutdown: CancelToken,
    url: String,
    method: String,
    headers: Vec<String>,
    data: Option<String>,
) -> Result<()> {
    let mut builder = http::Request::builder()
        .method(method.as_str())
        .uri(url.as_str());
    for raw in &headers {
        let (name, value) =
            parse_header(raw).ok_or_else(|| anyhow!("invalid header {:?}, expected 'Name: value'", raw))?;
        builder = builder.header(name, value);
    }
    let request = builder
        .body(data.map(Bytes::from).unwrap_or_default())
        .context("invalid request")?;

    let transport = ReqwestTransport::from_config(&config.upstream)?;
    let policy = config
        .retry
        .policy()
        .cancel(shutdown.clone())
        .error_log(TracingErrorLog);
    let client = pipeline(
        transport,
        dumper_from_config(&config, DebugFlusher),
        policy,
    );

    let response = tokio::select! {
        res = client.oneshot(request) => res.map_err(|e| anyhow!(e))?,
        _ = shutdown_signal(shutdown) => return Err(anyhow!("interrupted")),
    };

    let attempts = response.extensions().get::<Attempts>().map_or(1, |a| a.0);
    info!("{} after {} attempt(s)", response.status(), attempts);
    println!("{}", String::from_utf8_lossy(response.body()));
    Ok(())
}

async fn shutdown_signal(shutdown: CancelToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
    shutdown.cancel();
}
