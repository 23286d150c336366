//! HTTP Client Factory
//!
//! One builder per outbound concern so that timeouts, TLS policy and redirect
//! handling stay in a single place.

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Client, redirect};
use std::time::Duration;
use tracing::debug;

use crate::config::{ProxyConfig, VerificationConfig};

fn accept_any() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    headers
}

/// Client for downloading the playlist itself
pub fn playlist_client(timeout: Duration) -> reqwest::Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(format!(
            "{}/{}",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        ))
        .build()
}

/// Client for verification probes; follows redirects
///
/// The overall probe deadline is enforced by the prober, not the client.
pub fn probe_client(config: &VerificationConfig) -> reqwest::Result<Client> {
    debug!(
        "Creating probe client: connect timeout {:?}, accept invalid certs {}",
        config.connect_timeout, config.accept_invalid_certs
    );
    Client::builder()
        .connect_timeout(config.connect_timeout)
        .danger_accept_invalid_certs(config.accept_invalid_certs)
        .user_agent(config.user_agent.as_str())
        .default_headers(accept_any())
        .build()
}

/// Client for the streaming relay
///
/// Redirects are surfaced to the caller and proxy environment variables are ignored.
pub fn proxy_client(config: &ProxyConfig) -> reqwest::Result<Client> {
    debug!(
        "Creating relay client: connect timeout {:?}, accept invalid certs {}",
        config.connect_timeout, config.accept_invalid_certs
    );
    Client::builder()
        .no_proxy()
        .redirect(redirect::Policy::none())
        .connect_timeout(config.connect_timeout)
        .danger_accept_invalid_certs(config.accept_invalid_certs)
        .user_agent(config.user_agent.as_str())
        .default_headers(accept_any())
        .build()
}
