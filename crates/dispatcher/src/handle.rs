//! SinkHandle - one sink behind its own bounded queue and worker task
//!
//! A slow or failing sink only loses its own batches; the collector and the
//! other sinks keep running.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

use contracts::{BatchSink, ReadingBatch};

use crate::error::DispatcherError;
use crate::metrics::SinkMetrics;

/// Handle to a running sink worker
pub struct SinkHandle {
    name: String,
    /// Batches are shared between sinks, never copied
    tx: mpsc::Sender<Arc<ReadingBatch>>,
    metrics: Arc<SinkMetrics>,
    worker_handle: JoinHandle<()>,
}

impl SinkHandle {
    /// Spawn the worker task of `sink` with a queue of `queue_capacity` batches
    pub fn spawn<S: BatchSink + Send + 'static>(sink: S, queue_capacity: usize) -> Self {
        let name = sink.name().to_string();
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let metrics = Arc::new(SinkMetrics::new(&name));

        let worker_metrics = Arc::clone(&metrics);
        let worker_name = name.clone();

        let worker_handle = tokio::spawn(async move {
            sink_worker(sink, rx, worker_metrics, worker_name).await;
        });

        Self {
            name,
            tx,
            metrics,
            worker_handle,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metrics(&self) -> &Arc<SinkMetrics> {
        &self.metrics
    }

    /// Queue a batch without waiting.
    ///
    /// # Errors
    /// `QueueFull` when the sink is behind; the batch is dropped for this
    /// sink only.
    pub fn try_send(&self, batch: Arc<ReadingBatch>) -> Result<(), DispatcherError> {
        match self.tx.try_send(batch) {
            Ok(()) => {
                let queued = self.tx.max_capacity() - self.tx.capacity();
                self.metrics.set_queue_len(queued);
                Ok(())
            }
            Err(mpsc::error::TrySendError::Full(b)) => {
                self.metrics.record_dropped();
                warn!(
                    sink = %self.name,
                    batch_id = b.batch_id,
                    "Queue full, batch dropped"
                );
                Err(DispatcherError::QueueFull {
                    sink_name: self.name.clone(),
                    batch_id: b.batch_id,
                })
            }
            Err(mpsc::error::TrySendError::Closed(b)) => {
                error!(sink = %self.name, batch_id = b.batch_id, "Sink worker closed unexpectedly");
                Err(DispatcherError::sink_creation(&self.name, "worker closed"))
            }
        }
    }

    /// Stop accepting batches, drain the queue, then flush and close the sink
    #[instrument(name = "sink_handle_shutdown", skip(self), fields(sink = %self.name))]
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.worker_handle.await {
            error!(sink = %self.name, error = ?e, "Worker task panicked");
        }
        debug!(sink = %self.name, "SinkHandle shutdown complete");
    }
}

#[instrument(
    name = "sink_worker_loop",
    skip(sink, rx, metrics),
    fields(sink = %name)
)]
async fn sink_worker<S: BatchSink>(
    mut sink: S,
    mut rx: mpsc::Receiver<Arc<ReadingBatch>>,
    metrics: Arc<SinkMetrics>,
    name: String,
) {
    debug!(sink = %name, "Sink worker started");

    while let Some(batch) = rx.recv().await {
        metrics.set_queue_len(rx.len());

        match sink.write(&batch).await {
            Ok(()) => metrics.record_write(batch.batch_id, batch.len()),
            Err(e) => {
                metrics.record_failure();
                error!(
                    sink = %name,
                    batch_id = batch.batch_id,
                    error = %e,
                    "Write failed"
                );
            }
        }
    }

    if let Err(e) = sink.flush().await {
        error!(sink = %name, error = %e, "Flush failed on shutdown");
    }
    if let Err(e) = sink.close().await {
        error!(sink = %name, error = %e, "Close failed on shutdown");
    }

    debug!(sink = %name, "Sink worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::ContractError;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use tokio::time::{sleep, Duration};

    struct MockSink {
        name: String,
        write_count: Arc<AtomicU64>,
        closed: Arc<AtomicBool>,
        should_fail: bool,
        delay_ms: u64,
    }

    impl MockSink {
        fn new(name: &str) -> Self {
            Self {
                name: name.to_string(),
                write_count: Arc::new(AtomicU64::new(0)),
                closed: Arc::new(AtomicBool::new(false)),
                should_fail: false,
                delay_ms: 0,
            }
        }
    }

    impl BatchSink for MockSink {
        fn name(&self) -> &str {
            &self.name
        }

        async fn write(&mut self, _batch: &ReadingBatch) -> Result<(), ContractError> {
            if self.delay_ms > 0 {
                sleep(Duration::from_millis(self.delay_ms)).await;
            }
            if self.should_fail {
                return Err(ContractError::sink_write(&self.name, "mock failure"));
            }
            self.write_count.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }

        async fn flush(&mut self) -> Result<(), ContractError> {
            Ok(())
        }

        async fn close(&mut self) -> Result<(), ContractError> {
            self.closed.store(true, Ordering::Relaxed);
            Ok(())
        }
    }

    fn batch(batch_id: u64) -> Arc<ReadingBatch> {
        Arc::new(ReadingBatch {
            batch_id,
            label: String::new(),
            meta: String::new(),
            person_id: String::new(),
            samples: Vec::new(),
        })
    }

    #[tokio::test]
    async fn test_sink_handle_basic() {
        let sink = MockSink::new("test");
        let write_count = Arc::clone(&sink.write_count);
        let closed = Arc::clone(&sink.closed);

        let handle = SinkHandle::spawn(sink, 10);
        for i in 0..5 {
            assert!(handle.try_send(batch(i)).is_ok());
        }
        let metrics = Arc::clone(handle.metrics());

        handle.shutdown().await;
        assert_eq!(write_count.load(Ordering::Relaxed), 5);
        assert!(closed.load(Ordering::Relaxed));
        assert_eq!(metrics.last_batch_id(), Some(4));
    }

    #[tokio::test]
    async fn test_sink_handle_queue_full() {
        let mut sink = MockSink::new("slow");
        sink.delay_ms = 100;

        let handle = SinkHandle::spawn(sink, 2);
        let rejected = (0..10)
            .filter(|&i| {
                matches!(
                    handle.try_send(batch(i)),
                    Err(DispatcherError::QueueFull { .. })
                )
            })
            .count();

        assert!(rejected > 0);
        assert_eq!(handle.metrics().dropped_count(), rejected as u64);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_sink_handle_failure_isolation() {
        let mut sink = MockSink::new("failing");
        sink.should_fail = true;

        let handle = SinkHandle::spawn(sink, 10);
        for i in 0..3 {
            handle.try_send(batch(i)).unwrap();
        }
        let metrics = Arc::clone(handle.metrics());

        // shutdown 会先排空队列
        handle.shutdown().await;
        assert_eq!(metrics.failure_count(), 3);
        assert_eq!(metrics.batches_written(), 0);
    }
}
