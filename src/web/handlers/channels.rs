//! Channel catalog and verification status handlers

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

use crate::models::{Channel, ChannelKind};
use crate::web::AppState;

/// Wire representation of a checked channel
#[derive(Debug, Serialize)]
pub struct ChannelResponse {
    pub name: String,
    pub url: String,
    pub verified: bool,
    pub folder: String,
    pub logo: String,
    pub group: String,
    #[serde(rename = "type")]
    pub kind: ChannelKind,
    pub last_checked: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl From<Channel> for ChannelResponse {
    fn from(channel: Channel) -> Self {
        Self {
            name: channel.name,
            url: channel.url,
            verified: channel.verified,
            folder: channel.category.to_string(),
            logo: channel.logo,
            group: channel.group,
            kind: channel.kind,
            last_checked: channel.last_checked,
            error: channel.error.map(|e| e.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VerificationStarted {
    pub started: bool,
}

/// Checked channels keyed by catalog name; unprobed channels are omitted
pub async fn list_channels(State(state): State<AppState>) -> impl IntoResponse {
    let channels: Vec<ChannelResponse> = state
        .registry
        .checked_channels()
        .await
        .into_iter()
        .map(ChannelResponse::from)
        .collect();

    let mut catalog = BTreeMap::new();
    catalog.insert(state.catalog_name.to_string(), channels);
    Json(catalog)
}

pub async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.registry.status().await)
}

/// Kick off a verification pass; a no-op while one is already running
pub async fn start_verification(State(state): State<AppState>) -> impl IntoResponse {
    let started = state.engine.try_start();
    if started {
        info!("Verification pass started on request");
    }
    (StatusCode::ACCEPTED, Json(VerificationStarted { started }))
}
