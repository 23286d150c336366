use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

pub mod defaults;
pub mod duration_serde;

use crate::errors::ConfigError;
use defaults::*;
use duration_serde::{duration, option_duration};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub playlist: PlaylistConfig,
    #[serde(default)]
    pub verification: VerificationConfig,
    #[serde(default)]
    pub proxy: ProxyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Remote playlist source and catalog presentation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistConfig {
    #[serde(default = "default_playlist_url")]
    pub url: String,
    /// Key under which `/channels` publishes the checked channels
    #[serde(default = "default_catalog_name")]
    pub catalog_name: String,
    #[serde(default = "default_fetch_timeout", with = "duration")]
    pub fetch_timeout: Duration,
    /// Periodic full reload of the playlist; unset means load once at startup
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "option_duration"
    )]
    pub refresh_interval: Option<Duration>,
}

/// Verification engine tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationConfig {
    /// Number of probes launched together; the next batch waits for the whole batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Process-wide ceiling on in-flight probe connections
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    #[serde(default = "default_batch_pause", with = "duration")]
    pub batch_pause: Duration,
    #[serde(default = "default_probe_connect_timeout", with = "duration")]
    pub connect_timeout: Duration,
    /// Total budget for one probe: connect, headers and body prefix
    #[serde(default = "default_probe_timeout", with = "duration")]
    pub probe_timeout: Duration,
    /// SECURITY: disables TLS certificate validation for probes
    #[serde(default = "default_accept_invalid_certs")]
    pub accept_invalid_certs: bool,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Periodic re-verification; unset means a single pass after each load
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "option_duration"
    )]
    pub reverify_interval: Option<Duration>,
}

/// Streaming proxy upstream behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    #[serde(default = "default_proxy_connect_timeout", with = "duration")]
    pub connect_timeout: Duration,
    /// Time allowed for upstream response headers; the body itself is unbounded
    #[serde(default = "default_proxy_response_timeout", with = "duration")]
    pub response_timeout: Duration,
    /// Maximum size of each chunk written to the client
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// SECURITY: disables TLS certificate validation for relayed streams
    #[serde(default = "default_accept_invalid_certs")]
    pub accept_invalid_certs: bool,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

// Web defaults
fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

// Playlist defaults
fn default_playlist_url() -> String {
    DEFAULT_PLAYLIST_URL.to_string()
}

fn default_catalog_name() -> String {
    DEFAULT_CATALOG_NAME.to_string()
}

fn default_fetch_timeout() -> Duration {
    Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS)
}

// Verification defaults
fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_max_connections() -> usize {
    DEFAULT_MAX_CONNECTIONS
}

fn default_batch_pause() -> Duration {
    Duration::from_millis(DEFAULT_BATCH_PAUSE_MILLIS)
}

fn default_probe_connect_timeout() -> Duration {
    Duration::from_secs(DEFAULT_PROBE_CONNECT_TIMEOUT_SECS)
}

fn default_probe_timeout() -> Duration {
    Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS)
}

// Proxy defaults
fn default_proxy_connect_timeout() -> Duration {
    Duration::from_secs(DEFAULT_PROXY_CONNECT_TIMEOUT_SECS)
}

fn default_proxy_response_timeout() -> Duration {
    Duration::from_secs(DEFAULT_PROXY_RESPONSE_TIMEOUT_SECS)
}

fn default_chunk_size() -> usize {
    DEFAULT_PROXY_CHUNK_SIZE
}

fn default_accept_invalid_certs() -> bool {
    DEFAULT_ACCEPT_INVALID_CERTS
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for PlaylistConfig {
    fn default() -> Self {
        Self {
            url: default_playlist_url(),
            catalog_name: default_catalog_name(),
            fetch_timeout: default_fetch_timeout(),
            refresh_interval: None,
        }
    }
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_connections: default_max_connections(),
            batch_pause: default_batch_pause(),
            connect_timeout: default_probe_connect_timeout(),
            probe_timeout: default_probe_timeout(),
            accept_invalid_certs: default_accept_invalid_certs(),
            user_agent: default_user_agent(),
            reverify_interval: None,
        }
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            connect_timeout: default_proxy_connect_timeout(),
            response_timeout: default_proxy_response_timeout(),
            chunk_size: default_chunk_size(),
            accept_invalid_certs: default_accept_invalid_certs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Config {
    pub fn load_from_file(config_file: &str) -> Result<Self, ConfigError> {
        let config = if std::path::Path::new(config_file).exists() {
            let contents = std::fs::read_to_string(config_file)?;
            toml::from_str(&contents)?
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config)?;
            std::fs::write(config_file, contents)?;
            info!("Created default config file: {}", config_file);
            default_config
        };

        Ok(config)
    }

    /// Reject settings that would stall the engine or the proxy
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.verification.batch_size == 0 {
            return Err(ConfigError::invalid("verification.batch_size", "must be at least 1"));
        }
        if self.verification.max_connections == 0 {
            return Err(ConfigError::invalid(
                "verification.max_connections",
                "must be at least 1",
            ));
        }
        if self.proxy.chunk_size == 0 {
            return Err(ConfigError::invalid("proxy.chunk_size", "must be at least 1"));
        }
        if let Err(e) = url::Url::parse(&self.playlist.url) {
            return Err(ConfigError::invalid("playlist.url", e.to_string()));
        }
        Ok(())
    }
}
