//! Per-session statistics record.

use std::collections::BTreeMap;

use contracts::{
    AnalysisConfig, Axis, ContractError, OscillationComposite, SensorFamily, Session, StatsRecord,
};
use tracing::debug;

use crate::calm::{segment_family, AccelerometerCalm, MagnetometerCalm};
use crate::frame::TimeSeriesFrame;
use crate::posture::PostureEstimator;
use crate::stationarity::StationarityEstimator;
use crate::timing::{TimingDiagnostics, TIME_BETWEEN_BATCHES, TIME_BETWEEN_MEASUREMENTS};

pub const MESS_PORTION_ACC: &str = "mess_portion_acc";
pub const MESS_PORTION_MAG: &str = "mess_portion_mag";
pub const LEAN_BACK_PORTION: &str = "lean_back_portion";
pub const OSCILLATION_ACC: &str = "oscillation_acc";

/// Builds one [`StatsRecord`] per session from a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct StatsAggregator {
    config: AnalysisConfig,
}

impl StatsAggregator {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Full record of one session.
    ///
    /// `k_sigma` overrides the stationarity band multiplier. Timing keys are
    /// present only when the timestamps allow the diagnostics.
    ///
    /// # Errors
    /// `MissingChannel` if the session lacks an accelerometer or
    /// magnetometer axis or a configured stationarity channel;
    /// `DegenerateInput` if a series is too short for its statistic.
    pub fn session_stats(
        &self,
        session: &Session,
        k_sigma: Option<f64>,
    ) -> Result<StatsRecord, ContractError> {
        let frame = TimeSeriesFrame::new(session);
        let config = &self.config;
        let mut metrics = BTreeMap::new();

        // 加速度计: 逐轴 mess 与 oscillation
        let acc = segment_family(
            &frame,
            SensorFamily::Acc,
            &AccelerometerCalm::from_config(&config.acc_calm),
        )?;
        let mut oscillations = [f64::NAN; 3];
        for (i, (axis, calm)) in Axis::ALL.iter().zip(&acc.axes).enumerate() {
            let suffix = axis.suffix();
            metrics.insert(format!("{MESS_PORTION_ACC}_{suffix}"), calm.mess_portion());
            let oscillation = calm.oscillation.unwrap_or(f64::NAN);
            metrics.insert(format!("{OSCILLATION_ACC}_{suffix}"), oscillation);
            oscillations[i] = oscillation;
        }
        let mean_oscillation = acc.mean_oscillation().unwrap_or(f64::NAN);
        // 历史输出: 该列取三轴 oscillation 均值而非合并掩码
        metrics.insert(MESS_PORTION_ACC.to_string(), mean_oscillation);
        let composite = match config.oscillation_composite {
            OscillationComposite::ZAxis => oscillations[2],
            OscillationComposite::MeanOfAxes => mean_oscillation,
        };
        metrics.insert(OSCILLATION_ACC.to_string(), composite);

        metrics.insert(
            LEAN_BACK_PORTION.to_string(),
            PostureEstimator::new(config.posture.clone()).estimate(&frame)?,
        );

        let mag = segment_family(
            &frame,
            SensorFamily::Mag,
            &MagnetometerCalm::from_config(&config.mag_calm),
        )?;
        for (axis, calm) in Axis::ALL.iter().zip(&mag.axes) {
            metrics.insert(
                format!("{MESS_PORTION_MAG}_{}", axis.suffix()),
                calm.mess_portion(),
            );
        }
        metrics.insert(MESS_PORTION_MAG.to_string(), mag.mess_portion);

        let mut stationarity = StationarityEstimator::from_config(&config.stationarity);
        if let Some(k) = k_sigma {
            stationarity = stationarity.with_sigma(k);
        }
        metrics.extend(stationarity.metrics(&frame)?);

        match TimingDiagnostics::from_config(config).analyze_frame(&frame) {
            Ok(report) => {
                metrics.insert(
                    TIME_BETWEEN_MEASUREMENTS.to_string(),
                    report.time_between_measurements,
                );
                if let Some(tbb) = report.time_between_batches {
                    metrics.insert(TIME_BETWEEN_BATCHES.to_string(), tbb);
                }
            }
            Err(e) => debug!(session = %session.id(), error = %e, "timing skipped"),
        }

        Ok(StatsRecord::new(session.id().clone(), metrics))
    }

    /// Stationarity keys only
    ///
    /// # Errors
    /// `MissingChannel` for an absent configured channel.
    pub fn stationarity(
        &self,
        session: &Session,
        k_sigma: Option<f64>,
    ) -> Result<StatsRecord, ContractError> {
        let mut estimator = StationarityEstimator::from_config(&self.config.stationarity);
        if let Some(k) = k_sigma {
            estimator = estimator.with_sigma(k);
        }
        let metrics = estimator.metrics(&TimeSeriesFrame::new(session))?;
        Ok(StatsRecord::new(session.id().clone(), metrics))
    }

    /// Timing diagnostics as a record
    ///
    /// # Errors
    /// `DegenerateInput` when the timestamps cannot be analyzed.
    pub fn timing(&self, session: &Session) -> Result<StatsRecord, ContractError> {
        let report = TimingDiagnostics::from_config(&self.config)
            .analyze_frame(&TimeSeriesFrame::new(session))?;
        Ok(StatsRecord::new(session.id().clone(), report.metrics()))
    }
}

/// [`StatsAggregator::session_stats`] with a one-off configuration
pub fn session_stats(
    session: &Session,
    config: &AnalysisConfig,
    k_sigma: Option<f64>,
) -> Result<StatsRecord, ContractError> {
    StatsAggregator::new(config.clone()).session_stats(session, k_sigma)
}

/// Presentation view of a record (four renamed headline metrics)
pub fn truncated(record: &StatsRecord) -> StatsRecord {
    record.truncated()
}

/// Fraction of exact zeros per recorded channel (timestamps excluded).
///
/// An empty session yields NaN for every channel.
pub fn zeros_portion(session: &Session) -> StatsRecord {
    let metrics = session
        .columns()
        .iter()
        .map(|(channel, column)| {
            let zeros = column.iter().filter(|&&v| v == 0.0).count();
            let portion = if column.is_empty() {
                f64::NAN
            } else {
                zeros as f64 / column.len() as f64
            };
            (channel.name().to_string(), portion)
        })
        .collect();
    StatsRecord::new(session.id().clone(), metrics)
}
