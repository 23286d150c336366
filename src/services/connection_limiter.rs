//! Connection Limiter Service
//!
//! Caps the number of upstream probe connections open at once across every
//! batch of a verification pass, and records the high-water mark.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};
use tracing::trace;

#[derive(Debug, Default)]
struct Counters {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

/// Process-wide connection limiter
#[derive(Debug, Clone)]
pub struct ConnectionLimiter {
    permits: Arc<Semaphore>,
    max_connections: usize,
    counters: Arc<Counters>,
}

impl ConnectionLimiter {
    pub fn new(max_connections: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_connections)),
            max_connections,
            counters: Arc::new(Counters::default()),
        }
    }

    /// Wait for a free slot; the slot is returned when the handle drops
    pub async fn acquire(&self) -> Result<ConnectionHandle, AcquireError> {
        let permit = Arc::clone(&self.permits).acquire_owned().await?;

        let current = self.counters.in_flight.fetch_add(1, Ordering::AcqRel) + 1;
        self.counters.peak.fetch_max(current, Ordering::AcqRel);
        trace!("Connection acquired: {}/{}", current, self.max_connections);

        Ok(ConnectionHandle {
            _permit: permit,
            counters: Arc::clone(&self.counters),
        })
    }

    pub fn in_flight(&self) -> usize {
        self.counters.in_flight.load(Ordering::Acquire)
    }

    pub fn peak(&self) -> usize {
        self.counters.peak.load(Ordering::Acquire)
    }

    /// Restart peak tracking from the current in-flight count
    pub fn reset_peak(&self) {
        self.counters
            .peak
            .store(self.in_flight(), Ordering::Release);
    }
}

/// Handle for an acquired connection slot that auto-releases when dropped
pub struct ConnectionHandle {
    _permit: OwnedSemaphorePermit,
    counters: Arc<Counters>,
}

impl Drop for ConnectionHandle {
    fn drop(&mut self) {
        self.counters.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}
