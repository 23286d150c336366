//! Error type definitions for the live TV proxy

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Serialize, Serializer};
use thiserror::Error;
use tracing::{error, warn};

/// Failures while fetching the remote playlist
#[derive(Error, Debug)]
pub enum IngestionError {
    /// The configured playlist URL is not an absolute URL
    #[error("Invalid playlist URL '{url}': {source}")]
    InvalidSourceUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// Transport failure talking to the playlist host
    #[error("Failed to fetch playlist: {0}")]
    Fetch(#[from] reqwest::Error),

    /// The playlist host answered with something other than 200
    #[error("Playlist fetch returned HTTP {status}")]
    HttpStatus { status: u16 },
}

/// Why a single channel probe did not verify
///
/// The set is closed; the web layer renders it to text when serializing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("HTTP {0}")]
    HttpStatus(u16),

    #[error("Timeout")]
    Timeout,

    #[error("Invalid stream format")]
    InvalidFormat,

    /// Any other transport failure, carrying the client's message
    #[error("{0}")]
    Transport(String),
}

impl ProbeError {
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl Serialize for ProbeError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// Streaming proxy failures
#[derive(Error, Debug)]
pub enum ProxyError {
    /// The client-supplied target cannot be used as an upstream URL
    #[error("Invalid stream URL: {0}")]
    InvalidUrl(String),

    /// Connect failure or response-header timeout
    #[error("Stream error: {0}")]
    Upstream(String),

    #[error("Internal server error")]
    Internal(String),
}

impl ProxyError {
    pub fn upstream<S: Into<String>>(message: S) -> Self {
        Self::Upstream(message.into())
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidUrl(_) => StatusCode::BAD_REQUEST,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        match &self {
            Self::Internal(detail) => error!("Proxy internal error: {}", detail),
            other => warn!("Proxy request failed: {}", other),
        }

        (
            self.status_code(),
            [
                (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
                (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            ],
            self.to_string(),
        )
            .into_response()
    }
}

/// Configuration loading and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to access config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to render default config: {0}")]
    Render(#[from] toml::ser::Error),

    #[error("Invalid configuration: {field} - {message}")]
    Invalid { field: String, message: String },
}

impl ConfigError {
    /// Create a validation error for a specific field
    pub fn invalid<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self::Invalid {
            field: field.into(),
            message: message.into(),
        }
    }
}
