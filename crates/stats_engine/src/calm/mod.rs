//! Calm/mess segmentation.
//!
//! One capability, two strategies chosen by sensor family: accelerometer
//! axes use a percentile-trimmed amplitude band, magnetometer axes use the
//! derivative of a smoothing spline. Family masks are the AND of the axes.

mod accelerometer;
mod magnetometer;

pub use accelerometer::AccelerometerCalm;
pub use magnetometer::{MagnetometerCalm, SmoothedAxis};

use contracts::{AnalysisConfig, ContractError, SensorFamily};

use crate::frame::TimeSeriesFrame;
use crate::numeric::{mean, portion};

/// Calm mask of one axis
#[derive(Debug, Clone, PartialEq)]
pub struct AxisCalm {
    /// `true` where the sample is calm; same length as the input
    pub mask: Vec<bool>,
    /// Normalized trimmed spread (accelerometer strategy only)
    pub oscillation: Option<f64>,
}

impl AxisCalm {
    /// `1 − mean(mask)`
    pub fn mess_portion(&self) -> f64 {
        1.0 - portion(&self.mask)
    }
}

/// Per-axis segmentation strategy
pub trait CalmSegmentation {
    /// # Errors
    /// `DegenerateInput` when the axis is too short for the strategy.
    fn segment(&self, values: &[f64]) -> Result<AxisCalm, ContractError>;
}

/// Segmentation of one family's three axes
#[derive(Debug, Clone, PartialEq)]
pub struct FamilyCalm {
    pub family: SensorFamily,
    /// x, y, z
    pub axes: [AxisCalm; 3],
    /// Logical AND of the three axis masks
    pub combined_mask: Vec<bool>,
    /// `1 − mean(combined_mask)`
    pub mess_portion: f64,
}

impl FamilyCalm {
    fn from_axes(family: SensorFamily, axes: [AxisCalm; 3]) -> Self {
        let combined_mask: Vec<bool> = axes[0]
            .mask
            .iter()
            .zip(&axes[1].mask)
            .zip(&axes[2].mask)
            .map(|((x, y), z)| *x && *y && *z)
            .collect();
        let mess_portion = 1.0 - portion(&combined_mask);
        Self {
            family,
            axes,
            combined_mask,
            mess_portion,
        }
    }

    /// Per-axis oscillations, when the strategy produces them
    pub fn oscillations(&self) -> Option<[f64; 3]> {
        Some([
            self.axes[0].oscillation?,
            self.axes[1].oscillation?,
            self.axes[2].oscillation?,
        ])
    }

    /// Mean of the per-axis oscillations
    pub fn mean_oscillation(&self) -> Option<f64> {
        self.oscillations().map(|o| mean(&o))
    }
}

/// Strategy for a family, configured from the analysis settings
pub fn strategy_for(family: SensorFamily, config: &AnalysisConfig) -> Box<dyn CalmSegmentation> {
    match family {
        SensorFamily::Mag => Box::new(MagnetometerCalm::from_config(&config.mag_calm)),
        SensorFamily::Acc | SensorFamily::Gyro => {
            Box::new(AccelerometerCalm::from_config(&config.acc_calm))
        }
    }
}

/// Run `strategy` over the x/y/z axes of `family`.
///
/// # Errors
/// `MissingChannel` for an absent axis, or the strategy's own error.
pub fn segment_family(
    frame: &TimeSeriesFrame<'_>,
    family: SensorFamily,
    strategy: &dyn CalmSegmentation,
) -> Result<FamilyCalm, ContractError> {
    let [x, y, z] = frame.family(family)?;
    let axes = [strategy.segment(x)?, strategy.segment(y)?, strategy.segment(z)?];
    Ok(FamilyCalm::from_axes(family, axes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use contracts::{Sample, Session};
    use rand::Rng;

    fn session_with(family: SensorFamily, columns: [&[f64]; 3]) -> Session {
        let t0 = NaiveDate::from_ymd_opt(2019, 3, 14)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let samples: Vec<Sample> = (0..columns[0].len())
            .map(|i| {
                family
                    .channels()
                    .into_iter()
                    .zip(columns)
                    .fold(
                        Sample::new(t0 + Duration::milliseconds(10 * i as i64)),
                        |s, (c, col)| s.with(c, col[i]),
                    )
            })
            .collect();
        Session::from_samples("s".into(), 0.01, &samples).unwrap()
    }

    #[test]
    fn test_combined_mask_is_and_of_axes() {
        let mut rng = rand::rng();
        let n = 300;
        let cols: Vec<Vec<f64>> = (0..3)
            .map(|_| (0..n).map(|_| rng.random_range(-100.0..100.0)).collect())
            .collect();
        let session = session_with(SensorFamily::Acc, [&cols[0], &cols[1], &cols[2]]);
        let frame = TimeSeriesFrame::new(&session);
        let config = AnalysisConfig::default();

        let strategies: [Box<dyn CalmSegmentation>; 2] = [
            strategy_for(SensorFamily::Acc, &config),
            Box::new(AccelerometerCalm::new(10.0, 0.1, 25.0)),
        ];
        for family_strategy in strategies {
            let calm = segment_family(&frame, SensorFamily::Acc, family_strategy.as_ref()).unwrap();
            assert_eq!(calm.combined_mask.len(), n);
            for i in 0..n {
                let expected = calm.axes.iter().all(|a| a.mask[i]);
                assert_eq!(calm.combined_mask[i], expected);
            }
            assert!((0.0..=1.0).contains(&calm.mess_portion));
            let mean_mask = calm.combined_mask.iter().filter(|&&m| m).count() as f64 / n as f64;
            assert!((calm.mess_portion - (1.0 - mean_mask)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_magnetometer_family() {
        let flat: Vec<f64> = (0..100).map(|i| (i as f64 * 0.1).sin()).collect();
        let mut jump = flat.clone();
        for v in &mut jump[50..] {
            *v += 5000.0;
        }
        let session = session_with(SensorFamily::Mag, [&flat, &flat, &jump]);
        let frame = TimeSeriesFrame::new(&session);
        let strategy = strategy_for(SensorFamily::Mag, &AnalysisConfig::default());
        let calm = segment_family(&frame, SensorFamily::Mag, strategy.as_ref()).unwrap();

        assert!(calm.axes[0].mask.iter().all(|&m| m));
        assert!(calm.axes[2].mask.iter().any(|&m| !m));
        assert!(calm.oscillations().is_none());
        assert!(calm.mess_portion > 0.0);
        assert_eq!(calm.mess_portion, calm.axes[2].mess_portion());
    }

    #[test]
    fn test_missing_family() {
        let col = vec![0.0; 10];
        let session = session_with(SensorFamily::Acc, [&col, &col, &col]);
        let strategy = strategy_for(SensorFamily::Mag, &AnalysisConfig::default());
        let frame = TimeSeriesFrame::new(&session);
        let err = segment_family(&frame, SensorFamily::Mag, strategy.as_ref()).unwrap_err();
        assert!(matches!(err, ContractError::MissingChannel { .. }));
    }
}
