//! Health check HTTP handlers

use axum::{Json, extract::State, response::IntoResponse};
use chrono::Utc;
use serde_json::json;

use crate::web::AppState;

/// Liveness plus a summary of the catalog
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let status = state.registry.status().await;

    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now(),
        "channels": status.total,
        "verifying": status.verifying,
    }))
}
