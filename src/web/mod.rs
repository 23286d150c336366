//! Web layer module
//!
//! Thin axum handlers over the shared registry, verification engine and
//! stream relay. The proxy route carries its own CORS headers; the JSON API
//! uses a permissive `CorsLayer`.

use anyhow::Result;
use axum::{
    Router,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::{
    config::WebConfig,
    proxy::StreamProxy,
    services::{ChannelRegistry, VerificationEngine},
};

pub mod handlers;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub registry: ChannelRegistry,
    pub engine: Arc<VerificationEngine>,
    pub proxy: Arc<StreamProxy>,
    pub catalog_name: Arc<str>,
}

/// Web server configuration and setup
pub struct WebServer {
    app: Router,
    addr: SocketAddr,
}

impl WebServer {
    pub fn new(config: &WebConfig, state: AppState) -> Result<Self> {
        let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
        Ok(Self {
            app: Self::router(state),
            addr,
        })
    }

    /// Create the router with all routes and middleware
    pub fn router(state: AppState) -> Router {
        let api = Router::new()
            .route("/", get(handlers::index::index))
            .route("/health", get(handlers::health::health_check))
            .route("/channels", get(handlers::channels::list_channels))
            .route("/status", get(handlers::channels::get_status))
            .route("/verify", post(handlers::channels::start_verification))
            .layer(CorsLayer::permissive());

        Router::new()
            .merge(api)
            .route(
                "/proxy/{*url}",
                get(handlers::proxy::proxy_stream).options(handlers::proxy::proxy_preflight),
            )
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Serve until cancelled, reporting the bound address (or bind failure) first
    pub async fn serve_with_signal(
        self,
        ready_signal: oneshot::Sender<Result<SocketAddr>>,
        cancellation_token: CancellationToken,
    ) -> Result<()> {
        let listener = match tokio::net::TcpListener::bind(&self.addr).await {
            Ok(listener) => listener,
            Err(e) => {
                let message = format!("Failed to bind {}: {}", self.addr, e);
                let _ = ready_signal.send(Err(anyhow::anyhow!(message.clone())));
                return Err(anyhow::anyhow!(message));
            }
        };

        let local_addr = listener.local_addr()?;
        let _ = ready_signal.send(Ok(local_addr));
        info!("Web server listening on http://{}", local_addr);

        axum::serve(listener, self.app)
            .with_graceful_shutdown(async move {
                cancellation_token.cancelled().await;
                info!("Web server received cancellation signal, shutting down gracefully");
            })
            .await?;

        Ok(())
    }
}
