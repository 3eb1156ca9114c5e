//! Collector counters

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Collector metrics, shared between the loop and its observers
#[derive(Debug, Default)]
pub struct CollectorMetrics {
    /// Complete samples captured
    pub samples_read: AtomicU64,

    /// Sensor reads that failed (sample skipped)
    pub read_errors: AtomicU64,

    /// Batches handed to the dispatcher channel
    pub batches_sent: AtomicU64,

    /// Samples currently buffered
    pub pending: AtomicUsize,
}

impl CollectorMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_sample(&self, pending: usize) {
        self.samples_read.fetch_add(1, Ordering::Relaxed);
        self.pending.store(pending, Ordering::Relaxed);
    }

    pub fn record_read_error(&self) {
        self.read_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_batch_sent(&self) {
        self.batches_sent.fetch_add(1, Ordering::Relaxed);
        self.pending.store(0, Ordering::Relaxed);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            samples_read: self.samples_read.load(Ordering::Relaxed),
            read_errors: self.read_errors.load(Ordering::Relaxed),
            batches_sent: self.batches_sent.load(Ordering::Relaxed),
            pending: self.pending.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub samples_read: u64,
    pub read_errors: u64,
    pub batches_sent: u64,
    pub pending: usize,
}
