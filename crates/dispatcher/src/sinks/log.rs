//! LogSink - logs a batch summary via tracing

use contracts::{BatchSink, Channel, ContractError, ReadingBatch};
use tracing::{info, instrument};

/// Sink that logs batch summaries, for monitoring a running collection
pub struct LogSink {
    name: String,
    batches: u64,
    samples: u64,
}

/// Summary of one batch as logged
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSummary {
    pub samples: usize,
    /// Seconds between first and last sample
    pub span_secs: f64,
    /// Mean of `acc_z`, NaN if the batch has none
    pub mean_acc_z: f64,
}

impl BatchSummary {
    pub fn of(batch: &ReadingBatch) -> Self {
        let span_secs = match (batch.samples.first(), batch.samples.last()) {
            (Some(first), Some(last)) => {
                (last.timestamp - first.timestamp).num_milliseconds() as f64 / 1000.0
            }
            _ => 0.0,
        };
        let acc_z: Vec<f64> = batch
            .samples
            .iter()
            .filter_map(|s| s.values.get(&Channel::ACC_Z).copied())
            .collect();
        let mean_acc_z = if acc_z.is_empty() {
            f64::NAN
        } else {
            acc_z.iter().sum::<f64>() / acc_z.len() as f64
        };
        Self {
            samples: batch.len(),
            span_secs,
            mean_acc_z,
        }
    }
}

impl LogSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            batches: 0,
            samples: 0,
        }
    }
}

impl BatchSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_write",
        skip(self, batch),
        fields(sink = %self.name, batch_id = batch.batch_id)
    )]
    async fn write(&mut self, batch: &ReadingBatch) -> Result<(), ContractError> {
        let summary = BatchSummary::of(batch);
        self.batches += 1;
        self.samples += summary.samples as u64;

        info!(
            sink = %self.name,
            batch_id = batch.batch_id,
            person = %batch.person_id,
            label = %batch.label,
            samples = summary.samples,
            span_secs = summary.span_secs,
            mean_acc_z = summary.mean_acc_z,
            "ReadingBatch received"
        );
        Ok(())
    }

    #[instrument(name = "log_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(
            sink = %self.name,
            batches = self.batches,
            samples = self.samples,
            "LogSink closed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use contracts::Sample;

    #[tokio::test]
    async fn test_log_sink_write() {
        let mut sink = LogSink::new("test_log");
        let t0 = NaiveDate::from_ymd_opt(2019, 3, 14)
            .unwrap()
            .and_hms_milli_opt(12, 0, 0, 0)
            .unwrap();
        let batch = ReadingBatch {
            batch_id: 1,
            label: String::new(),
            meta: String::new(),
            person_id: "Ann Smith".to_string(),
            samples: vec![
                Sample::new(t0).with(Channel::ACC_Z, -1.0),
                Sample::new(t0 + chrono::TimeDelta::milliseconds(1500)).with(Channel::ACC_Z, -0.5),
            ],
        };

        let summary = BatchSummary::of(&batch);
        assert_eq!(summary.samples, 2);
        assert!((summary.span_secs - 1.5).abs() < 1e-12);
        assert!((summary.mean_acc_z + 0.75).abs() < 1e-12);

        assert!(sink.write(&batch).await.is_ok());
        assert_eq!(sink.samples, 2);
        assert!(sink.close().await.is_ok());
    }

    #[test]
    fn test_empty_batch_summary() {
        let batch = ReadingBatch {
            batch_id: 0,
            label: String::new(),
            meta: String::new(),
            person_id: String::new(),
            samples: Vec::new(),
        };
        let summary = BatchSummary::of(&batch);
        assert_eq!(summary.samples, 0);
        assert_eq!(summary.span_secs, 0.0);
        assert!(summary.mean_acc_z.is_nan());
    }

    #[test]
    fn test_log_sink_name() {
        let sink = LogSink::new("my_logger");
        assert_eq!(sink.name(), "my_logger");
    }
}
