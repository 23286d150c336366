//! Playlist ingestion: download, parse, classify and publish to the registry

use tracing::{error, info};
use url::Url;

use crate::config::PlaylistConfig;
use crate::errors::{IngestionError, IngestionResult};
use crate::models::Channel;
use crate::services::ChannelRegistry;
use crate::utils::http_client_factory;

pub mod classifier;
pub mod m3u_parser;
pub mod scheduler;

pub use scheduler::SchedulerService;

pub struct PlaylistIngestor {
    client: reqwest::Client,
    source: Url,
}

impl PlaylistIngestor {
    pub fn new(config: &PlaylistConfig) -> IngestionResult<Self> {
        let source =
            Url::parse(&config.url).map_err(|source| IngestionError::InvalidSourceUrl {
                url: config.url.clone(),
                source,
            })?;
        let client = http_client_factory::playlist_client(config.fetch_timeout)?;

        Ok(Self { client, source })
    }

    /// Download the playlist text; anything but HTTP 200 is an error
    pub async fn fetch(&self) -> IngestionResult<String> {
        info!("Loading channels from {}", self.source);

        let response = self.client.get(self.source.clone()).send().await?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(IngestionError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let content = response.text().await?;
        info!("Playlist downloaded: {} bytes", content.len());
        Ok(content)
    }

    /// Fetch and parse into fresh, unchecked channels
    pub async fn load_channels(&self) -> IngestionResult<Vec<Channel>> {
        let content = self.fetch().await?;

        let extinf_count = content
            .lines()
            .filter(|line| line.trim_start().starts_with("#EXTINF:"))
            .count();
        info!(
            "Playlist has {} lines, {} #EXTINF entries",
            content.lines().count(),
            extinf_count
        );

        let channels: Vec<Channel> = m3u_parser::parse_playlist(&content, &self.source)
            .into_iter()
            .map(Channel::from_entry)
            .collect();

        Ok(channels)
    }

    /// Replace the registry contents; on failure the registry is left untouched
    pub async fn ingest_into(&self, registry: &ChannelRegistry) -> IngestionResult<usize> {
        match self.load_channels().await {
            Ok(channels) => {
                let count = channels.len();
                let generation = registry.replace_all(channels).await;
                info!(
                    "Successfully loaded {} channels (generation {})",
                    count, generation
                );
                Ok(count)
            }
            Err(e) => {
                error!("Error loading channels from {}: {}", self.source, e);
                Err(e)
            }
        }
    }
}
