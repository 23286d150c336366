use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use livetv_proxy::{
    config::Config,
    ingestor::{PlaylistIngestor, SchedulerService},
    proxy::StreamProxy,
    services::{ChannelRegistry, HttpStreamProber, VerificationEngine},
    web::{AppState, WebServer},
};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[derive(Parser)]
#[command(name = "livetv-proxy")]
#[command(version)]
#[command(about = "Live TV playlist verifier and CORS-friendly stream relay")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Listening IP address
    #[arg(short = 'H', long, value_name = "IP")]
    host: Option<String>,

    /// Listening port
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,

    /// Playlist URL (overrides config file)
    #[arg(short = 'u', long, value_name = "URL")]
    playlist_url: Option<String>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging with specified level
    let log_filter = if cli.log_level == "trace" {
        format!("livetv_proxy={},tower_http=trace", cli.log_level)
    } else {
        format!("livetv_proxy={}", cli.log_level)
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Live TV Proxy v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration from specified file
    let mut config = Config::load_from_file(&cli.config)?;
    info!("Configuration loaded from: {}", cli.config);

    // Override config with CLI arguments
    if let Some(host) = cli.host {
        config.web.host = host;
    }
    if let Some(port) = cli.port {
        config.web.port = port;
    }
    if let Some(playlist_url) = cli.playlist_url {
        config.playlist.url = playlist_url;
    }
    config.validate()?;

    if config.verification.accept_invalid_certs {
        warn!("TLS certificate validation is disabled for channel verification");
    }
    if config.proxy.accept_invalid_certs {
        warn!("TLS certificate validation is disabled for proxied streams");
    }

    let registry = ChannelRegistry::new();
    let prober = Arc::new(HttpStreamProber::new(&config.verification)?);
    let engine = Arc::new(VerificationEngine::new(
        registry.clone(),
        prober,
        &config.verification,
    ));
    let proxy = Arc::new(StreamProxy::new(&config.proxy)?);
    let ingestor = Arc::new(PlaylistIngestor::new(&config.playlist)?);

    let state = AppState {
        registry: registry.clone(),
        engine: engine.clone(),
        proxy,
        catalog_name: config.playlist.catalog_name.as_str().into(),
    };
    let web_server = WebServer::new(&config.web, state)?;

    info!(
        "Starting web server on {}:{}",
        web_server.host(),
        web_server.port()
    );

    let cancellation_token = CancellationToken::new();

    // Create a channel to signal when the server is ready or fails to bind
    let (server_ready_tx, server_ready_rx) = tokio::sync::oneshot::channel();

    let server_token = cancellation_token.clone();
    let server_handle = tokio::spawn(async move {
        if let Err(e) = web_server
            .serve_with_signal(server_ready_tx, server_token)
            .await
        {
            error!("Web server failed: {}", e);
        }
    });

    // Wait for the server bind result (success or failure)
    match server_ready_rx.await {
        Ok(Ok(addr)) => {
            info!("Web server is now listening on {}, loading channels...", addr);
        }
        Ok(Err(bind_error)) => {
            error!("Failed to bind web server: {}", bind_error);
            return Err(bind_error);
        }
        Err(_) => {
            error!("Web server task completed without signaling");
            return Err(anyhow::anyhow!("Web server failed to start"));
        }
    }

    // Initial load; a failure leaves the catalog empty but the server keeps running
    if ingestor.ingest_into(&registry).await.is_ok() {
        engine.try_start();
    }

    let scheduler = SchedulerService::new(
        ingestor,
        registry,
        engine,
        config.playlist.refresh_interval,
        config.verification.reverify_interval,
    );
    let scheduler_token = cancellation_token.clone();
    tokio::spawn(async move {
        scheduler.start(scheduler_token).await;
    });

    info!("All services started successfully");

    shutdown_signal().await;
    cancellation_token.cancel();

    // Open stream relays can hold graceful shutdown indefinitely
    if tokio::time::timeout(SHUTDOWN_GRACE, server_handle).await.is_err() {
        warn!(
            "Web server did not stop within {:?}, exiting anyway",
            SHUTDOWN_GRACE
        );
    }

    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down gracefully"),
                    _ = tokio::signal::ctrl_c() => info!("Received SIGINT (Ctrl+C), shutting down gracefully"),
                }
                return;
            }
            Err(e) => warn!("Failed to install SIGTERM handler: {}", e),
        }
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
        return;
    }
    info!("Received Ctrl+C, shutting down gracefully");
}
