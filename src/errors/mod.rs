//! Centralized error handling for the live TV proxy
//!
//! Each layer owns a small `thiserror` enum:
//!
//! - **Ingestion Errors**: playlist download and source URL problems
//! - **Probe Errors**: the closed set of reasons a channel failed verification
//! - **Proxy Errors**: upstream relay failures, mapped onto HTTP responses
//! - **Config Errors**: configuration loading and validation
//!
//! The binary entry point wraps these in `anyhow`.

pub mod types;

pub use types::*;

/// Convenience type alias for Results using IngestionError
pub type IngestionResult<T> = Result<T, IngestionError>;

/// Convenience type alias for Results using ProxyError
pub type ProxyResult<T> = Result<T, ProxyError>;
