use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// Outcome of the most recent update pass, shared with the health endpoint.
#[derive(Debug, Default)]
pub struct PassStatus {
    // unix millis, 0 before the first pass
    finished_at: AtomicI64,
    delivered: AtomicU64,
    passes: AtomicU64,
}

impl PassStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, finished_at: DateTime<Utc>, delivered: usize) {
        self.delivered.store(delivered as u64, Ordering::Relaxed);
        self.passes.fetch_add(1, Ordering::Relaxed);
        self.finished_at
            .store(finished_at.timestamp_millis(), Ordering::Release);
    }

    pub fn last_pass(&self) -> Option<DateTime<Utc>> {
        match self.finished_at.load(Ordering::Acquire) {
            0 => None,
            millis => DateTime::from_timestamp_millis(millis),
        }
    }

    /// Entries delivered by the last pass.
    pub fn last_delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    pub fn passes(&self) -> u64 {
        self.passes.load(Ordering::Relaxed)
    }
}
