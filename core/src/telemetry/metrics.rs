use serde::{Deserialize, Serialize};
use std::sync::Mutex;

pub struct MetricsRecorder {
    inner: Mutex<MetricsSnapshot>,
}

/// Counters for one review session.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub processed: usize,
    pub skipped: usize,
    pub errors: usize,
    /// Classification calls not issued because one was still outstanding.
    pub throttled: usize,
    /// Results that arrived after the session had moved on.
    pub stale: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsSnapshot::default()),
        }
    }

    fn update<F: FnOnce(&mut MetricsSnapshot)>(&self, f: F) {
        if let Ok(mut metrics) = self.inner.lock() {
            f(&mut metrics);
        }
    }

    pub fn record_processed(&self) {
        self.update(|m| m.processed += 1);
    }

    pub fn record_skipped(&self) {
        self.update(|m| m.skipped += 1);
    }

    pub fn record_error(&self) {
        self.update(|m| m.errors += 1);
    }

    pub fn record_throttled(&self) {
        self.update(|m| m.throttled += 1);
    }

    pub fn record_stale(&self) {
        self.update(|m| m.stale += 1);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.inner.lock().map(|m| *m).unwrap_or_default()
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}
