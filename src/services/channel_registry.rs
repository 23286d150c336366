//! Shared in-memory channel catalog and verification status

use chrono::Utc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, trace};

use crate::models::{Channel, ProbeOutcome, RegistryStatus};

#[derive(Debug, Default)]
struct RegistryState {
    generation: u64,
    channels: Vec<Channel>,
}

/// Channel list plus the single in-progress flag for verification passes
///
/// Cloning is cheap; all clones share the same state.
#[derive(Clone, Default)]
pub struct ChannelRegistry {
    state: Arc<RwLock<RegistryState>>,
    verifying: Arc<AtomicBool>,
}

/// Held for the duration of a verification pass; clears the flag on drop
#[derive(Debug)]
pub struct PassGuard {
    verifying: Arc<AtomicBool>,
}

impl Drop for PassGuard {
    fn drop(&mut self) {
        self.verifying.store(false, Ordering::Release);
        trace!("Verification pass guard released");
    }
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically swap in a new channel list and return its generation
    pub async fn replace_all(&self, channels: Vec<Channel>) -> u64 {
        let mut state = self.state.write().await;
        state.generation += 1;
        state.channels = channels;
        debug!(
            "Registry replaced with {} channels, generation {}",
            state.channels.len(),
            state.generation
        );
        state.generation
    }

    pub async fn generation(&self) -> u64 {
        self.state.read().await.generation
    }

    /// Consistent copy of the current channels with their generation
    pub async fn snapshot(&self) -> (u64, Vec<Channel>) {
        let state = self.state.read().await;
        (state.generation, state.channels.clone())
    }

    /// Channels that have been probed at least once, in file order
    pub async fn checked_channels(&self) -> Vec<Channel> {
        self.state
            .read()
            .await
            .channels
            .iter()
            .filter(|c| c.is_checked())
            .cloned()
            .collect()
    }

    pub async fn status(&self) -> RegistryStatus {
        let state = self.state.read().await;
        RegistryStatus {
            total: state.channels.len(),
            working: state.channels.iter().filter(|c| c.verified).count(),
            verifying: self.is_verifying(),
        }
    }

    /// Store a probe result; returns false when the registry has moved on to a
    /// newer generation or the index no longer exists
    pub async fn record_probe(&self, generation: u64, index: usize, outcome: ProbeOutcome) -> bool {
        let mut state = self.state.write().await;
        if state.generation != generation {
            trace!(
                "Discarding probe result for generation {} (current {})",
                generation, state.generation
            );
            return false;
        }
        match state.channels.get_mut(index) {
            Some(channel) => {
                channel.apply_probe(outcome, Utc::now());
                true
            }
            None => false,
        }
    }

    /// Claim the in-progress flag; `None` if a pass is already running
    pub fn try_begin_pass(&self) -> Option<PassGuard> {
        self.verifying
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| PassGuard {
                verifying: Arc::clone(&self.verifying),
            })
    }

    pub fn is_verifying(&self) -> bool {
        self.verifying.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ProbeError;
    use crate::models::PlaylistEntry;

    fn channels(names: &[&str]) -> Vec<Channel> {
        names
            .iter()
            .map(|name| {
                Channel::from_entry(PlaylistEntry {
                    duration: -1,
                    title: name.to_string(),
                    logo: String::new(),
                    group: String::new(),
                    url: format!("http://example.com/{name}.m3u8"),
                })
            })
            .collect()
    }

    #[tokio::test]
    async fn test_replace_all_bumps_generation() {
        let registry = ChannelRegistry::new();
        assert_eq!(registry.generation().await, 0);

        assert_eq!(registry.replace_all(channels(&["a", "b"])).await, 1);
        assert_eq!(registry.replace_all(channels(&["c"])).await, 2);

        let (generation, current) = registry.snapshot().await;
        assert_eq!(generation, 2);
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].name, "c");
    }

    #[tokio::test]
    async fn test_checked_listing_and_status() {
        let registry = ChannelRegistry::new();
        let generation = registry.replace_all(channels(&["a", "b", "c"])).await;

        assert!(registry.checked_channels().await.is_empty());

        assert!(registry.record_probe(generation, 0, Ok(())).await);
        assert!(
            registry
                .record_probe(generation, 2, Err(ProbeError::HttpStatus(404)))
                .await
        );

        let checked = registry.checked_channels().await;
        assert_eq!(checked.len(), 2);
        assert_eq!(checked[0].name, "a");
        assert_eq!(checked[1].name, "c");
        assert_eq!(checked[1].error, Some(ProbeError::HttpStatus(404)));

        let status = registry.status().await;
        assert_eq!(status.total, 3);
        assert_eq!(status.working, 1);
        assert!(!status.verifying);
    }

    #[tokio::test]
    async fn test_stale_generation_results_are_discarded() {
        let registry = ChannelRegistry::new();
        let old = registry.replace_all(channels(&["a"])).await;
        registry.replace_all(channels(&["b"])).await;

        assert!(!registry.record_probe(old, 0, Ok(())).await);
        assert!(registry.checked_channels().await.is_empty());
    }

    #[tokio::test]
    async fn test_out_of_range_index_is_ignored() {
        let registry = ChannelRegistry::new();
        let generation = registry.replace_all(channels(&["a"])).await;

        assert!(!registry.record_probe(generation, 5, Ok(())).await);
    }

    #[test]
    fn test_pass_guard_is_single_flight() {
        let registry = ChannelRegistry::new();

        let guard = registry.try_begin_pass().expect("first pass starts");
        assert!(registry.is_verifying());
        assert!(registry.try_begin_pass().is_none());

        drop(guard);
        assert!(!registry.is_verifying());
        assert!(registry.try_begin_pass().is_some());
    }
}
