//! 采集循环
//!
//! `CollectorLoop` 按 `timestep_detect` 读取传感器，将样本写入
//! `ReadingCollector`；每满一个批次，在锁内一次性取出并清空缓冲，
//! 然后再发送到下游通道。发送期间新到达的样本只会进入下一个批次。

use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Local;
use contracts::{ChairSensor, CollectorConfig, ReadingBatch, Sample, SensorFamily};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};

use crate::config::{CollectorMetrics, MetricsSnapshot};
use crate::error::{IngestionError, Result};

/// Buffer of samples waiting for the next batch
#[derive(Debug, Default)]
pub struct ReadingCollector {
    pending: Mutex<Vec<Sample>>,
}

impl ReadingCollector {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Sample>> {
        // 缓冲只包含已完整写入的样本，中毒后仍可继续使用
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append one sample, returns the new buffer length
    pub fn push(&self, sample: Sample) -> usize {
        let mut pending = self.lock();
        pending.push(sample);
        pending.len()
    }

    /// Capture and clear the buffer in one step
    pub fn take_batch(&self) -> Vec<Sample> {
        mem::take(&mut *self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Outcome of a finished run
#[derive(Debug, Clone, PartialEq)]
pub struct CollectorSummary {
    pub batches: u64,
    pub metrics: MetricsSnapshot,
}

/// Periodic sampling loop feeding a batch channel
pub struct CollectorLoop<S: ChairSensor> {
    sensor: S,
    config: CollectorConfig,
    batch_limit: Option<usize>,
    collector: Arc<ReadingCollector>,
    metrics: Arc<CollectorMetrics>,
    running: Arc<AtomicBool>,
}

impl<S: ChairSensor> CollectorLoop<S> {
    pub fn new(sensor: S, config: CollectorConfig) -> Self {
        Self {
            sensor,
            config,
            batch_limit: None,
            collector: Arc::new(ReadingCollector::new()),
            metrics: Arc::new(CollectorMetrics::new()),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Stop after `batches` batches instead of `max_time / timestep_send`
    pub fn with_batch_limit(mut self, batches: usize) -> Self {
        self.batch_limit = Some(batches);
        self
    }

    pub fn metrics(&self) -> Arc<CollectorMetrics> {
        self.metrics.clone()
    }

    /// Flag that ends the run after the current sample when cleared
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }

    /// Read every family once; `None` if any read failed
    fn sample_once(&mut self) -> Option<Sample> {
        let mut sample = Sample::new(Local::now().naive_local());
        for family in SensorFamily::ALL {
            match self.sensor.read(family) {
                Ok(values) => {
                    for (channel, value) in family.channels().into_iter().zip(values) {
                        sample = sample.with(channel, value);
                    }
                }
                Err(e) => {
                    let err = IngestionError::SensorRead {
                        sensor: self.sensor.name().to_string(),
                        source: e,
                    };
                    warn!(family = ?family, error = %err, "sample skipped");
                    self.metrics.record_read_error();
                    return None;
                }
            }
        }
        Some(sample)
    }

    /// Run until all batches are sent or the running flag is cleared.
    ///
    /// A partially filled batch left by a stop is still sent.
    ///
    /// # Errors
    /// `ChannelClosed` when the receiver is dropped.
    #[instrument(name = "collector_run", skip(self, tx), fields(sensor = %self.sensor.name()))]
    pub async fn run(mut self, tx: mpsc::Sender<ReadingBatch>) -> Result<CollectorSummary> {
        let per_batch = self.config.samples_per_batch();
        let batches = self.batch_limit.unwrap_or_else(|| self.config.batch_count());
        let period = Duration::from_secs_f64(self.config.timestep_detect.max(1e-6));

        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.running.store(true, Ordering::SeqCst);

        info!(batches, per_batch, period_ms = period.as_secs_f64() * 1000.0, "collector started");

        let mut sent = 0u64;
        for batch_id in 0..batches as u64 {
            for _ in 0..per_batch {
                if !self.running.load(Ordering::Relaxed) {
                    break;
                }
                interval.tick().await;
                if let Some(sample) = self.sample_once() {
                    let pending = self.collector.push(sample);
                    self.metrics.record_sample(pending);
                }
            }

            let samples = self.collector.take_batch();
            let batch = ReadingBatch {
                batch_id,
                label: self.config.label.clone(),
                meta: self.config.meta.clone(),
                person_id: self.config.person_id.clone(),
                samples,
            };
            observability::record_batch_collected(batch_id, batch.len());
            debug!(batch_id, samples = batch.len(), "batch captured");

            if tx.send(batch).await.is_err() {
                self.running.store(false, Ordering::SeqCst);
                return Err(IngestionError::ChannelClosed { batches: sent });
            }
            self.metrics.record_batch_sent();
            sent += 1;

            if !self.running.load(Ordering::Relaxed) {
                break;
            }
        }

        self.running.store(false, Ordering::SeqCst);
        let summary = CollectorSummary {
            batches: sent,
            metrics: self.metrics.snapshot(),
        };
        info!(batches = sent, samples = summary.metrics.samples_read, "collector finished");
        Ok(summary)
    }
}
