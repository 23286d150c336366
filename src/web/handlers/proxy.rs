//! Streaming relay handlers

use axum::{
    extract::{Path, RawQuery, State},
    http::HeaderMap,
    response::Response,
};

use crate::errors::ProxyResult;
use crate::proxy::http_stream::{preflight_response, resolve_target};
use crate::web::AppState;

/// Relay `GET /proxy/{*url}` to the upstream stream
pub async fn proxy_stream(
    State(state): State<AppState>,
    Path(url): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> ProxyResult<Response> {
    let target = resolve_target(&url, query.as_deref())?;
    state.proxy.relay(&target, &headers).await
}

pub async fn proxy_preflight() -> ProxyResult<Response> {
    preflight_response()
}
