use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::ProbeError;

/// Result of probing one channel
pub type ProbeOutcome = Result<(), ProbeError>;

/// Fixed content label assigned by the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    News,
    Sports,
    Movies,
    Entertainment,
    Kids,
    Music,
    Documentary,
    Series,
    Lifestyle,
    Religious,
    Business,
    Weather,
    General,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::News => "News",
            Category::Sports => "Sports",
            Category::Movies => "Movies",
            Category::Entertainment => "Entertainment",
            Category::Kids => "Kids",
            Category::Music => "Music",
            Category::Documentary => "Documentary",
            Category::Series => "Series",
            Category::Lifestyle => "Lifestyle",
            Category::Religious => "Religious",
            Category::Business => "Business",
            Category::Weather => "Weather",
            Category::General => "General",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    #[default]
    Live,
}

/// One `#EXTINF` entry paired with its stream URL, as it appears in the file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistEntry {
    pub duration: i64,
    pub title: String,
    pub logo: String,
    pub group: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub name: String,
    pub url: String,
    pub category: Category,
    pub logo: String,
    pub group: String,
    pub kind: ChannelKind,
    pub verified: bool,
    pub last_checked: Option<DateTime<Utc>>,
    pub error: Option<ProbeError>,
}

impl Channel {
    /// Build an unchecked channel from a parsed entry, classifying it on the way
    pub fn from_entry(entry: PlaylistEntry) -> Self {
        let category = crate::ingestor::classifier::classify(&entry.title, &entry.group);
        Self {
            name: entry.title,
            url: entry.url,
            category,
            logo: entry.logo,
            group: entry.group,
            kind: ChannelKind::Live,
            verified: false,
            last_checked: None,
            error: None,
        }
    }

    pub fn is_checked(&self) -> bool {
        self.last_checked.is_some()
    }

    /// Overwrite the verification fields with a fresh probe result
    pub fn apply_probe(&mut self, outcome: ProbeOutcome, checked_at: DateTime<Utc>) {
        match outcome {
            Ok(()) => {
                self.verified = true;
                self.error = None;
            }
            Err(e) => {
                self.verified = false;
                self.error = Some(e);
            }
        }
        self.last_checked = Some(checked_at);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegistryStatus {
    pub total: usize,
    pub working: usize,
    pub verifying: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(title: &str, group: &str) -> PlaylistEntry {
        PlaylistEntry {
            duration: -1,
            title: title.to_string(),
            logo: String::new(),
            group: group.to_string(),
            url: "http://example.com/live.m3u8".to_string(),
        }
    }

    #[test]
    fn test_from_entry_starts_unchecked_and_classified() {
        let channel = Channel::from_entry(entry("CNN HD", "News"));

        assert_eq!(channel.name, "CNN HD");
        assert_eq!(channel.category, Category::News);
        assert_eq!(channel.kind, ChannelKind::Live);
        assert!(!channel.verified);
        assert!(!channel.is_checked());
        assert!(channel.error.is_none());
    }

    #[test]
    fn test_apply_probe_keeps_verified_and_error_exclusive() {
        let mut channel = Channel::from_entry(entry("Local 5", ""));
        let now = Utc::now();

        channel.apply_probe(Err(ProbeError::HttpStatus(404)), now);
        assert!(!channel.verified);
        assert_eq!(channel.error, Some(ProbeError::HttpStatus(404)));
        assert_eq!(channel.last_checked, Some(now));

        channel.apply_probe(Ok(()), now);
        assert!(channel.verified);
        assert!(channel.error.is_none());
    }

    #[test]
    fn test_kind_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(ChannelKind::Live).unwrap(),
            serde_json::json!("live")
        );
    }
}
