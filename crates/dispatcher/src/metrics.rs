//! Per-sink counters
//!
//! Each `SinkHandle` owns one `SinkMetrics`; the worker task and the
//! dispatcher update it concurrently, readers take a `MetricsSnapshot`.
//! Every update is mirrored to the global `metrics` recorder.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Counters of a single sink
#[derive(Debug)]
pub struct SinkMetrics {
    sink_name: String,
    /// Batches waiting in the sink queue
    queue_len: AtomicUsize,
    /// Batches written successfully
    batches_written: AtomicU64,
    /// Samples contained in the written batches
    samples_written: AtomicU64,
    /// Batches the sink rejected
    failure_count: AtomicU64,
    /// Batches dropped because the queue was full
    dropped_count: AtomicU64,
    /// Id of the last batch written (`u64::MAX` before the first write)
    last_batch_id: AtomicU64,
}

impl SinkMetrics {
    pub fn new(sink_name: impl Into<String>) -> Self {
        Self {
            sink_name: sink_name.into(),
            queue_len: AtomicUsize::new(0),
            batches_written: AtomicU64::new(0),
            samples_written: AtomicU64::new(0),
            failure_count: AtomicU64::new(0),
            dropped_count: AtomicU64::new(0),
            last_batch_id: AtomicU64::new(u64::MAX),
        }
    }

    pub fn sink_name(&self) -> &str {
        &self.sink_name
    }

    pub fn queue_len(&self) -> usize {
        self.queue_len.load(Ordering::Relaxed)
    }

    pub fn set_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
        observability::record_queue_depth(&self.sink_name, len);
    }

    pub fn batches_written(&self) -> u64 {
        self.batches_written.load(Ordering::Relaxed)
    }

    pub fn samples_written(&self) -> u64 {
        self.samples_written.load(Ordering::Relaxed)
    }

    /// 记录一次成功写入
    pub fn record_write(&self, batch_id: u64, samples: usize) {
        self.batches_written.fetch_add(1, Ordering::Relaxed);
        self.samples_written
            .fetch_add(samples as u64, Ordering::Relaxed);
        self.last_batch_id.store(batch_id, Ordering::Relaxed);
        observability::record_batch_dispatched(&self.sink_name, true);
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    /// 记录一次写入失败
    pub fn record_failure(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
        observability::record_batch_dispatched(&self.sink_name, false);
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }

    /// 队列已满，批次被丢弃
    pub fn record_dropped(&self) {
        self.dropped_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn last_batch_id(&self) -> Option<u64> {
        match self.last_batch_id.load(Ordering::Relaxed) {
            u64::MAX => None,
            id => Some(id),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queue_len: self.queue_len(),
            batches_written: self.batches_written(),
            samples_written: self.samples_written(),
            failure_count: self.failure_count(),
            dropped_count: self.dropped_count(),
            last_batch_id: self.last_batch_id(),
        }
    }
}

/// Point-in-time copy of `SinkMetrics`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub queue_len: usize,
    pub batches_written: u64,
    pub samples_written: u64,
    pub failure_count: u64,
    pub dropped_count: u64,
    pub last_batch_id: Option<u64>,
}

impl MetricsSnapshot {
    /// Batches that reached the sink worker, written or not
    pub fn delivered(&self) -> u64 {
        self.batches_written + self.failure_count
    }
}
