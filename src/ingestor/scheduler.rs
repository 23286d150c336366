use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use super::PlaylistIngestor;
use crate::services::{ChannelRegistry, VerificationEngine};

/// Optional periodic playlist reloads and re-verification passes
pub struct SchedulerService {
    ingestor: Arc<PlaylistIngestor>,
    registry: ChannelRegistry,
    engine: Arc<VerificationEngine>,
    refresh_interval: Option<Duration>,
    reverify_interval: Option<Duration>,
}

impl SchedulerService {
    pub fn new(
        ingestor: Arc<PlaylistIngestor>,
        registry: ChannelRegistry,
        engine: Arc<VerificationEngine>,
        refresh_interval: Option<Duration>,
        reverify_interval: Option<Duration>,
    ) -> Self {
        Self {
            ingestor,
            registry,
            engine,
            refresh_interval,
            reverify_interval,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.refresh_interval.is_some() || self.reverify_interval.is_some()
    }

    pub async fn start(self, cancel: CancellationToken) {
        if !self.is_enabled() {
            debug!("No refresh or re-verification interval configured, scheduler idle");
            return;
        }

        info!(
            "Starting scheduler (refresh: {}, re-verify: {})",
            describe(self.refresh_interval),
            describe(self.reverify_interval)
        );

        let mut refresh = self.refresh_interval.map(periodic);
        let mut reverify = self.reverify_interval.map(periodic);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Scheduler shutting down");
                    break;
                }

                _ = next_tick(&mut refresh) => {
                    self.refresh().await;
                }

                _ = next_tick(&mut reverify) => {
                    trace!("Re-verification tick");
                    self.engine.try_start();
                }
            }
        }
    }

    /// Reload the playlist and verify it, holding the pass flag throughout
    ///
    /// Claiming the flag before the fetch keeps a manual pass from starting on
    /// the catalog that is about to be replaced.
    async fn refresh(&self) {
        let Some(guard) = self.registry.try_begin_pass() else {
            info!("Verification in progress, skipping scheduled playlist refresh");
            return;
        };
        if self.ingestor.ingest_into(&self.registry).await.is_ok() {
            self.engine.start_with_guard(guard);
        }
    }
}

/// First tick one period from now
fn periodic(period: Duration) -> Interval {
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

async fn next_tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        // If no interval, return a future that never completes
        None => std::future::pending::<()>().await,
    }
}

fn describe(interval: Option<Duration>) -> String {
    interval
        .map(|d| humantime::format_duration(d).to_string())
        .unwrap_or_else(|| "disabled".to_string())
}
