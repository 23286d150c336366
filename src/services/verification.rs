//! Batched, single-flight verification of every channel in the registry

use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::channel_registry::{ChannelRegistry, PassGuard};
use super::connection_limiter::ConnectionLimiter;
use super::stream_prober::ChannelProbe;
use crate::config::VerificationConfig;
use crate::errors::ProbeError;

/// Totals reported at the end of a pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassSummary {
    pub total: usize,
    pub verified: usize,
    pub failed: usize,
    /// Results dropped because the registry was reloaded mid-pass
    pub discarded: usize,
    pub peak_in_flight: usize,
    pub elapsed: Duration,
}

pub struct VerificationEngine {
    registry: ChannelRegistry,
    prober: Arc<dyn ChannelProbe>,
    limiter: ConnectionLimiter,
    batch_size: usize,
    batch_pause: Duration,
}

enum ProbeRecord {
    Verified,
    Failed,
    Discarded,
}

impl VerificationEngine {
    pub fn new(
        registry: ChannelRegistry,
        prober: Arc<dyn ChannelProbe>,
        config: &VerificationConfig,
    ) -> Self {
        Self {
            registry,
            prober,
            limiter: ConnectionLimiter::new(config.max_connections),
            batch_size: config.batch_size.max(1),
            batch_pause: config.batch_pause,
        }
    }

    pub fn limiter(&self) -> &ConnectionLimiter {
        &self.limiter
    }

    /// Start a pass in the background; returns false if one is already running
    ///
    /// The in-progress flag is claimed before this returns, so a status read
    /// right after a `true` result reports `verifying`.
    pub fn try_start(self: &Arc<Self>) -> bool {
        let Some(guard) = self.registry.try_begin_pass() else {
            info!("Verification already in progress, ignoring start request");
            return false;
        };

        self.start_with_guard(guard);
        true
    }

    /// Run a background pass under a flag the caller already claimed
    pub fn start_with_guard(self: &Arc<Self>, guard: PassGuard) {
        let engine = Arc::clone(self);
        tokio::spawn(async move {
            engine.execute(guard).await;
        });
    }

    /// Run a pass to completion on the current task; `None` if one is already running
    pub async fn run_pass(&self) -> Option<PassSummary> {
        let guard = self.registry.try_begin_pass()?;
        Some(self.execute(guard).await)
    }

    async fn execute(&self, _guard: PassGuard) -> PassSummary {
        let started = Instant::now();
        self.limiter.reset_peak();

        let (generation, channels) = self.registry.snapshot().await;
        let urls: Vec<String> = channels.into_iter().map(|c| c.url).collect();
        let total = urls.len();
        info!(
            "Starting verification of {} channels in batches of {}",
            total, self.batch_size
        );

        let mut summary = PassSummary {
            total,
            verified: 0,
            failed: 0,
            discarded: 0,
            peak_in_flight: 0,
            elapsed: Duration::ZERO,
        };

        for (batch_index, batch) in urls.chunks(self.batch_size).enumerate() {
            let offset = batch_index * self.batch_size;
            let probes = batch
                .iter()
                .enumerate()
                .map(|(i, url)| self.probe_one(generation, offset + i, url));

            for record in join_all(probes).await {
                match record {
                    ProbeRecord::Verified => summary.verified += 1,
                    ProbeRecord::Failed => summary.failed += 1,
                    ProbeRecord::Discarded => summary.discarded += 1,
                }
            }

            let done = offset + batch.len();
            debug!("Verified batch {}: {}/{} channels", batch_index + 1, done, total);

            if done < total && !self.batch_pause.is_zero() {
                tokio::time::sleep(self.batch_pause).await;
            }
        }

        summary.peak_in_flight = self.limiter.peak();
        summary.elapsed = started.elapsed();

        if summary.discarded > 0 {
            warn!(
                "Registry reloaded during verification, {} results discarded",
                summary.discarded
            );
        }
        info!(
            "Verification complete: {} total, {} verified, {} failed, peak {} in flight, took {:?}",
            summary.total,
            summary.verified,
            summary.failed,
            summary.peak_in_flight,
            summary.elapsed
        );

        summary
    }

    async fn probe_one(&self, generation: u64, index: usize, url: &str) -> ProbeRecord {
        let outcome = match self.limiter.acquire().await {
            Ok(_handle) => self.prober.probe(url).await,
            Err(e) => Err(ProbeError::Transport(e.to_string())),
        };

        match &outcome {
            Ok(()) => debug!("Channel verified: {}", url),
            Err(e) => debug!("Channel failed: {} ({})", url, e),
        }

        let verified = outcome.is_ok();
        if !self.registry.record_probe(generation, index, outcome).await {
            ProbeRecord::Discarded
        } else if verified {
            ProbeRecord::Verified
        } else {
            ProbeRecord::Failed
        }
    }
}
