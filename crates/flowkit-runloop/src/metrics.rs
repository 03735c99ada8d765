//! Runner counters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Counters updated by `emit` and the dispatch loop.
#[derive(Debug, Default)]
pub struct RunnerMetrics {
    /// Events accepted by `emit`.
    pub emitted: AtomicU64,

    /// Events refused by `emit` (saturated, not running, stopped).
    pub rejected: AtomicU64,

    /// Events taken off the queue and handled.
    pub processed: AtomicU64,

    /// Dispatches that returned an error.
    pub dispatch_failures: AtomicU64,

    /// Follow-up and failure events enqueued by the loop itself.
    pub follow_ups: AtomicU64,

    /// Follow-ups that could not be enqueued.
    pub dropped_follow_ups: AtomicU64,

    /// Re-dispatches after transient failures.
    pub retries: AtomicU64,

    start_time: parking_lot::RwLock<Option<Instant>>,
}

impl RunnerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_start(&self) {
        *self.start_time.write() = Some(Instant::now());
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time
            .read()
            .map(|t| t.elapsed().as_secs())
            .unwrap_or(0)
    }

    pub fn record_emitted(&self) {
        self.emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_processed(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dispatch_failure(&self) {
        self.dispatch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_follow_up(&self) {
        self.follow_ups.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped_follow_up(&self) {
        self.dropped_follow_ups.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: Utc::now(),
            uptime_secs: self.uptime_secs(),
            emitted: self.emitted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            processed: self.processed.load(Ordering::Relaxed),
            dispatch_failures: self.dispatch_failures.load(Ordering::Relaxed),
            follow_ups: self.follow_ups.load(Ordering::Relaxed),
            dropped_follow_ups: self.dropped_follow_ups.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`RunnerMetrics`].
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub uptime_secs: u64,
    pub emitted: u64,
    pub rejected: u64,
    pub processed: u64,
    pub dispatch_failures: u64,
    pub follow_ups: u64,
    pub dropped_follow_ups: u64,
    pub retries: u64,
}

impl MetricsSnapshot {
    /// Events accepted but not yet handled.
    pub fn pending(&self) -> u64 {
        (self.emitted + self.follow_ups).saturating_sub(self.processed)
    }

    /// Fraction of handled events whose dispatch failed.
    pub fn failure_rate(&self) -> f64 {
        if self.processed == 0 {
            return 0.0;
        }
        self.dispatch_failures as f64 / self.processed as f64
    }
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;
