//! Stream Probing Service
//!
//! Decides whether a channel URL currently serves a playable stream by
//! fetching its headers and the first bytes of its body.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use tracing::debug;

use crate::config::VerificationConfig;
use crate::errors::ProbeError;
use crate::models::ProbeOutcome;
use crate::utils::http_client_factory;

/// Bytes of body inspected per probe
pub const PROBE_PREFIX_BYTES: usize = 1024;

const HLS_MARKER: &[u8] = b"#EXTM3U";

/// Something that can check a single stream URL
#[async_trait]
pub trait ChannelProbe: Send + Sync {
    async fn probe(&self, url: &str) -> ProbeOutcome;
}

/// How a response body should be validated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamFormat {
    /// HLS playlist; body must carry the `#EXTM3U` marker
    Hls,
    /// Raw media; any body bytes are accepted
    Binary,
    Unknown,
}

impl StreamFormat {
    /// Classify from the request URL and the lowercased `Content-Type`
    pub fn detect(url: &str, content_type: &str) -> Self {
        if url.to_lowercase().contains(".m3u8")
            || content_type.contains("application/x-mpegurl")
            || content_type.contains("application/vnd.apple.mpegurl")
        {
            StreamFormat::Hls
        } else if content_type.contains("video/")
            || content_type.contains("audio/")
            || content_type.contains("application/octet-stream")
        {
            StreamFormat::Binary
        } else {
            StreamFormat::Unknown
        }
    }
}

/// HTTP GET based prober with a hard deadline per probe
pub struct HttpStreamProber {
    client: Client,
    probe_timeout: Duration,
}

impl HttpStreamProber {
    pub fn new(config: &VerificationConfig) -> reqwest::Result<Self> {
        Ok(Self {
            client: http_client_factory::probe_client(config)?,
            probe_timeout: config.probe_timeout,
        })
    }

    async fn check(&self, url: &str) -> ProbeOutcome {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProbeError::from_reqwest(&e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ProbeError::HttpStatus(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_lowercase();

        match StreamFormat::detect(url, &content_type) {
            StreamFormat::Hls => {
                let prefix = read_prefix(response).await?;
                if contains_marker(&prefix) {
                    Ok(())
                } else {
                    Err(ProbeError::InvalidFormat)
                }
            }
            StreamFormat::Binary => {
                let prefix = read_prefix(response).await?;
                if prefix.is_empty() {
                    Err(ProbeError::InvalidFormat)
                } else {
                    Ok(())
                }
            }
            StreamFormat::Unknown => {
                debug!("Unrecognised content type '{}' for {}", content_type, url);
                Err(ProbeError::InvalidFormat)
            }
        }
    }
}

#[async_trait]
impl ChannelProbe for HttpStreamProber {
    async fn probe(&self, url: &str) -> ProbeOutcome {
        tokio::time::timeout(self.probe_timeout, self.check(url))
            .await
            .unwrap_or(Err(ProbeError::Timeout))
    }
}

/// Read up to `PROBE_PREFIX_BYTES` of the body, stopping early at end of stream
///
/// A broken body yields whatever arrived before the failure; only a timeout
/// is reported as an error.
async fn read_prefix(mut response: Response) -> Result<Vec<u8>, ProbeError> {
    let mut prefix = Vec::with_capacity(PROBE_PREFIX_BYTES);

    while prefix.len() < PROBE_PREFIX_BYTES {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                let take = (PROBE_PREFIX_BYTES - prefix.len()).min(chunk.len());
                prefix.extend_from_slice(&chunk[..take]);
            }
            Ok(None) => break,
            Err(e) if e.is_timeout() => return Err(ProbeError::Timeout),
            Err(e) => {
                debug!("Body read failed after {} bytes: {}", prefix.len(), e);
                break;
            }
        }
    }

    Ok(prefix)
}

fn contains_marker(prefix: &[u8]) -> bool {
    prefix
        .windows(HLS_MARKER.len())
        .any(|window| window == HLS_MARKER)
}
