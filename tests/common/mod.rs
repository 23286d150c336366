#![allow(dead_code)]

use axum::{Router, body::Body, http::Request, response::Response};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use livetv_proxy::{
    config::{ProxyConfig, VerificationConfig},
    proxy::StreamProxy,
    services::{ChannelRegistry, HttpStreamProber, VerificationEngine},
    web::{AppState, WebServer},
};

/// Serve `router` on an ephemeral local port
pub async fn spawn_upstream(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// An address nothing is listening on
pub async fn closed_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

pub fn test_verification_config() -> VerificationConfig {
    VerificationConfig {
        batch_pause: Duration::from_millis(1),
        probe_timeout: Duration::from_millis(500),
        ..Default::default()
    }
}

pub struct TestApp {
    pub router: Router,
    pub registry: ChannelRegistry,
    pub engine: Arc<VerificationEngine>,
}

pub fn build_app() -> TestApp {
    let registry = ChannelRegistry::new();
    let verification = test_verification_config();
    let prober = Arc::new(HttpStreamProber::new(&verification).unwrap());
    let engine = Arc::new(VerificationEngine::new(
        registry.clone(),
        prober,
        &verification,
    ));
    let proxy_config = ProxyConfig {
        response_timeout: Duration::from_secs(2),
        ..Default::default()
    };
    let proxy = Arc::new(StreamProxy::new(&proxy_config).unwrap());

    let router = WebServer::router(AppState {
        registry: registry.clone(),
        engine: engine.clone(),
        proxy,
        catalog_name: "North American TV".into(),
    });

    TestApp {
        router,
        registry,
        engine,
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

/// `/proxy/<percent-encoded target>`
pub fn proxy_uri(target: &str) -> String {
    format!("/proxy/{}", urlencoding::encode(target))
}
