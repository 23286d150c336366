//! CORS-friendly HTTP stream relay.
//!
//! Key behaviors:
//!   - Upstream redirects are not followed; a 3xx with `Location` becomes a
//!     `302 Found` to the client.
//!   - Only response headers are bounded by a timeout; live bodies stay open.
//!   - Body bytes are forwarded as they arrive, split to at most `chunk_size`.

use std::time::Duration;

use axum::body::Body;
use axum::http::{HeaderMap, HeaderValue, Response, StatusCode, header};
use bytes::Bytes;
use futures::{Stream, StreamExt, stream};
use reqwest::Client;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::ProxyConfig;
use crate::errors::{ProxyError, ProxyResult};
use crate::utils::http_client_factory;

const DEFAULT_RANGE: &str = "bytes=0-";
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Client request headers passed through to the upstream when present
const FORWARDED_REQUEST_HEADERS: [header::HeaderName; 2] =
    [header::IF_MODIFIED_SINCE, header::IF_NONE_MATCH];

/// Upstream response headers copied onto the relayed response
const RELAYED_RESPONSE_HEADERS: [header::HeaderName; 4] = [
    header::CONTENT_TYPE,
    header::CONTENT_LENGTH,
    header::CONTENT_RANGE,
    header::ACCEPT_RANGES,
];

/// Add the fixed cross-origin headers every proxy response carries
pub fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, OPTIONS, HEAD"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Range"),
    );
    headers.insert(
        header::ACCESS_CONTROL_EXPOSE_HEADERS,
        HeaderValue::from_static("Content-Length, Content-Range, Content-Type"),
    );
}

/// Turn the decoded `/proxy/{*url}` capture plus the raw query into an upstream URL
///
/// Values that arrive still percent-encoded (`http%3A...`) are decoded once more.
pub fn resolve_target(captured: &str, raw_query: Option<&str>) -> ProxyResult<Url> {
    let lower = captured.to_ascii_lowercase();
    let mut target = if lower.starts_with("http%3a") || lower.starts_with("https%3a") {
        urlencoding::decode(captured)
            .map_err(|e| ProxyError::InvalidUrl(format!("{captured}: {e}")))?
            .into_owned()
    } else {
        captured.to_string()
    };

    if let Some(query) = raw_query.filter(|q| !q.is_empty()) {
        target.push(if target.contains('?') { '&' } else { '?' });
        target.push_str(query);
    }

    let url = Url::parse(&target).map_err(|e| ProxyError::InvalidUrl(format!("{target}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ProxyError::InvalidUrl(target));
    }
    Ok(url)
}

/// Split each upstream chunk so no emitted piece exceeds `chunk_size`
pub fn rechunk<S, E>(upstream: S, chunk_size: usize) -> impl Stream<Item = Result<Bytes, E>>
where
    S: Stream<Item = Result<Bytes, E>>,
{
    let chunk_size = chunk_size.max(1);
    upstream.flat_map(move |item| {
        let pieces: Vec<Result<Bytes, E>> = match item {
            Ok(bytes) => split_bytes(bytes, chunk_size).into_iter().map(Ok).collect(),
            Err(e) => vec![Err(e)],
        };
        stream::iter(pieces)
    })
}

fn split_bytes(mut bytes: Bytes, chunk_size: usize) -> Vec<Bytes> {
    let mut pieces = Vec::with_capacity(bytes.len().div_ceil(chunk_size));
    while bytes.len() > chunk_size {
        pieces.push(bytes.split_to(chunk_size));
    }
    if !bytes.is_empty() {
        pieces.push(bytes);
    }
    pieces
}

/// Relays arbitrary upstream streams to browser clients
pub struct StreamProxy {
    client: Client,
    chunk_size: usize,
    response_timeout: Duration,
}

impl StreamProxy {
    pub fn new(config: &ProxyConfig) -> reqwest::Result<Self> {
        Ok(Self {
            client: http_client_factory::proxy_client(config)?,
            chunk_size: config.chunk_size,
            response_timeout: config.response_timeout,
        })
    }

    pub async fn relay(&self, target: &Url, request_headers: &HeaderMap) -> ProxyResult<Response<Body>> {
        info!("Proxying upstream stream: {}", target);

        let upstream_request = self
            .client
            .get(target.clone())
            .headers(build_upstream_headers(request_headers));

        let upstream = tokio::time::timeout(self.response_timeout, upstream_request.send())
            .await
            .map_err(|_| {
                ProxyError::upstream(format!(
                    "no response from {} within {:?}",
                    target, self.response_timeout
                ))
            })?
            .map_err(|e| {
                if e.is_builder() {
                    ProxyError::internal(e.to_string())
                } else {
                    ProxyError::upstream(e.to_string())
                }
            })?;

        let status = upstream.status();
        if status.is_redirection() {
            if let Some(location) = redirect_location(target, upstream.headers()) {
                debug!("Upstream {} redirected to {}", target, location);
                return redirect_response(&location);
            }
        }

        let mut builder = Response::builder().status(status);
        if let Some(headers) = builder.headers_mut() {
            for name in RELAYED_RESPONSE_HEADERS {
                if let Some(value) = upstream.headers().get(&name) {
                    headers.insert(name, value.clone());
                }
            }
            if !headers.contains_key(header::CONTENT_TYPE) {
                headers.insert(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static(DEFAULT_CONTENT_TYPE),
                );
            }
            apply_cors_headers(headers);
        }

        let source = target.to_string();
        let body_stream = rechunk(upstream.bytes_stream(), self.chunk_size).inspect(move |item| {
            if let Err(e) = item {
                warn!("Upstream stream {} ended with error: {}", source, e);
            }
        });

        debug!("Streaming {} with status {}", target, status);
        builder
            .body(Body::from_stream(body_stream))
            .map_err(|e| ProxyError::internal(e.to_string()))
    }
}

fn build_upstream_headers(request_headers: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::new();

    let range = request_headers
        .get(header::RANGE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_RANGE));
    headers.insert(header::RANGE, range);

    for name in FORWARDED_REQUEST_HEADERS {
        if let Some(value) = request_headers.get(&name) {
            headers.insert(name, value.clone());
        }
    }

    headers
}

/// Absolute redirect target, resolving relative locations against the upstream URL
fn redirect_location(target: &Url, upstream_headers: &HeaderMap) -> Option<String> {
    let location = upstream_headers.get(header::LOCATION)?.to_str().ok()?;
    if Url::parse(location).is_ok() {
        return Some(location.to_string());
    }
    target.join(location).ok().map(String::from)
}

fn redirect_response(location: &str) -> ProxyResult<Response<Body>> {
    let mut builder = Response::builder()
        .status(StatusCode::FOUND)
        .header(header::LOCATION, location);
    if let Some(headers) = builder.headers_mut() {
        apply_cors_headers(headers);
    }
    builder
        .body(Body::empty())
        .map_err(|e| ProxyError::internal(e.to_string()))
}

/// Answer for `OPTIONS` preflight on the proxy route
pub fn preflight_response() -> ProxyResult<Response<Body>> {
    let mut builder = Response::builder().status(StatusCode::NO_CONTENT);
    if let Some(headers) = builder.headers_mut() {
        apply_cors_headers(headers);
    }
    builder
        .body(Body::empty())
        .map_err(|e| ProxyError::internal(e.to_string()))
}
