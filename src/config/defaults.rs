//! Configuration default values
//!
//! This module contains all the default values for configuration options,
//! making them easily changeable in one central location.

// Web server defaults
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;

// Playlist defaults
pub const DEFAULT_PLAYLIST_URL: &str = "https://iptv-org.github.io/iptv/regions/nam.m3u";
pub const DEFAULT_CATALOG_NAME: &str = "North American TV";
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

// Verification defaults
pub const DEFAULT_BATCH_SIZE: usize = 25;
pub const DEFAULT_MAX_CONNECTIONS: usize = 25;
pub const DEFAULT_BATCH_PAUSE_MILLIS: u64 = 200;
pub const DEFAULT_PROBE_CONNECT_TIMEOUT_SECS: u64 = 2;
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 5;

// Streaming proxy defaults
pub const DEFAULT_PROXY_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_PROXY_RESPONSE_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_PROXY_CHUNK_SIZE: usize = 8192;

// Browser-like identity shared by the prober and the proxy
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
pub const DEFAULT_ACCEPT_INVALID_CERTS: bool = true;
