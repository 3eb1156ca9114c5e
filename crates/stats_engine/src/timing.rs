//! Sampling-rate diagnostics.
//!
//! The recorder sends samples in batches of `B`; the pause between the last
//! sample of one batch and the first of the next is the transmission gap.
//! Subtracting the gaps from the total elapsed time leaves the in-batch
//! sampling time, spread over `n − ⌊n/B⌋` in-batch intervals.

use std::collections::BTreeMap;

use chrono::{NaiveDateTime, TimeDelta};
use contracts::{AnalysisConfig, ContractError};
use serde::Serialize;

use crate::frame::TimeSeriesFrame;
use crate::numeric::mean;

pub const TIME_BETWEEN_MEASUREMENTS: &str = "time_between_measurements";
pub const TIME_BETWEEN_BATCHES: &str = "time_between_batches";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimingReport {
    /// last − first, seconds
    pub total_elapsed: f64,
    /// `t[kB] − t[kB−1]` for every batch boundary inside the session
    pub batch_gaps: Vec<f64>,
    /// Mean batch gap; `None` when the session holds a single batch
    pub time_between_batches: Option<f64>,
    pub time_between_measurements: f64,
    /// `time_between_measurements − measurement_interval`
    pub drift: f64,
    /// Seconds since the first sample, per sample
    pub time_passed: Vec<f64>,
}

impl TimingReport {
    /// Scalar outputs keyed by name (`time_between_batches` only when defined)
    pub fn metrics(&self) -> BTreeMap<String, f64> {
        let mut metrics = BTreeMap::new();
        metrics.insert("total_elapsed".to_string(), self.total_elapsed);
        metrics.insert(
            TIME_BETWEEN_MEASUREMENTS.to_string(),
            self.time_between_measurements,
        );
        metrics.insert("drift".to_string(), self.drift);
        if let Some(tbb) = self.time_between_batches {
            metrics.insert(TIME_BETWEEN_BATCHES.to_string(), tbb);
        }
        metrics
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimingDiagnostics {
    measurements_per_batch: usize,
    measurement_interval: f64,
}

impl TimingDiagnostics {
    pub fn new(measurements_per_batch: usize, measurement_interval: f64) -> Self {
        Self {
            measurements_per_batch,
            measurement_interval,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(config.measurements_per_batch, config.measurement_interval)
    }

    /// # Errors
    /// `DegenerateInput` for fewer than two samples, a zero batch size, or
    /// when every interval is a batch boundary.
    pub fn analyze(&self, timestamps: &[NaiveDateTime]) -> Result<TimingReport, ContractError> {
        let n = timestamps.len();
        if n < 2 {
            return Err(ContractError::degenerate(
                "timing_diagnostics",
                n,
                "at least two timestamps required",
            ));
        }
        let b = self.measurements_per_batch;
        if b == 0 {
            return Err(ContractError::degenerate(
                "timing_diagnostics",
                n,
                "measurements_per_batch must be > 0",
            ));
        }
        let intervals = n - n / b;
        if intervals == 0 {
            return Err(ContractError::degenerate(
                "timing_diagnostics",
                n,
                "no in-batch intervals",
            ));
        }

        let first = timestamps[0];
        let time_passed: Vec<f64> = timestamps.iter().map(|&t| seconds(t - first)).collect();
        let total_elapsed = time_passed[n - 1];

        let batch_gaps: Vec<f64> = (1..)
            .map(|k| k * b)
            .take_while(|&i| i < n)
            .map(|i| time_passed[i] - time_passed[i - 1])
            .collect();
        let time_between_batches = (!batch_gaps.is_empty()).then(|| mean(&batch_gaps));

        let gap_total: f64 = batch_gaps.iter().sum();
        let time_between_measurements = (total_elapsed - gap_total) / intervals as f64;

        Ok(TimingReport {
            total_elapsed,
            batch_gaps,
            time_between_batches,
            time_between_measurements,
            drift: time_between_measurements - self.measurement_interval,
            time_passed,
        })
    }

    /// Uses the session's own nominal interval.
    ///
    /// # Errors
    /// See [`analyze`](Self::analyze).
    pub fn analyze_frame(
        &self,
        frame: &TimeSeriesFrame<'_>,
    ) -> Result<TimingReport, ContractError> {
        Self::new(self.measurements_per_batch, frame.measurement_interval())
            .analyze(frame.timestamps())
    }
}

impl Default for TimingDiagnostics {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}

fn seconds(delta: TimeDelta) -> f64 {
    match delta.num_microseconds() {
        Some(us) => us as f64 / 1e6,
        None => delta.num_milliseconds() as f64 / 1e3,
    }
}
