//! Lean-back detection from the vertical accelerometer axis.

use contracts::{Channel, ContractError, PostureCalibration};

use crate::frame::TimeSeriesFrame;

#[derive(Debug, Clone, Default)]
pub struct PostureEstimator {
    calibration: PostureCalibration,
}

impl PostureEstimator {
    pub fn new(calibration: PostureCalibration) -> Self {
        Self { calibration }
    }

    pub fn calibration(&self) -> &PostureCalibration {
        &self.calibration
    }

    /// 低于阈值 `mean − n_sigma·std` 的 acc_z 样本占比
    ///
    /// # Errors
    /// `DegenerateInput` for an empty channel.
    pub fn lean_back_portion(&self, acc_z: &[f64]) -> Result<f64, ContractError> {
        if acc_z.is_empty() {
            return Err(ContractError::degenerate(
                "lean_back_portion",
                0,
                "acc_z is empty",
            ));
        }
        let threshold = self.calibration.threshold();
        let below = acc_z.iter().filter(|&&v| v < threshold).count();
        Ok(below as f64 / acc_z.len() as f64)
    }

    /// # Errors
    /// `MissingChannel` without `acc_z`, or see [`lean_back_portion`](Self::lean_back_portion).
    pub fn estimate(&self, frame: &TimeSeriesFrame<'_>) -> Result<f64, ContractError> {
        self.lean_back_portion(frame.channel(Channel::ACC_Z)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_below_threshold() {
        let estimator = PostureEstimator::default();
        assert_eq!(estimator.lean_back_portion(&[-16500.0; 40]).unwrap(), 1.0);
    }

    #[test]
    fn test_all_above_threshold() {
        let estimator = PostureEstimator::default();
        assert_eq!(estimator.lean_back_portion(&[-15910.0; 40]).unwrap(), 0.0);
        // 阈值本身不计入
        assert_eq!(estimator.lean_back_portion(&[-16000.0; 3]).unwrap(), 0.0);
    }

    #[test]
    fn test_mixed_and_custom_calibration() {
        let estimator = PostureEstimator::new(PostureCalibration {
            acc_z_mean: 0.0,
            acc_z_std: 1.0,
            n_sigma: 2.0,
        });
        let portion = estimator
            .lean_back_portion(&[-3.0, -2.5, -2.0, 0.0])
            .unwrap();
        assert_eq!(portion, 0.5);
        assert_eq!(estimator.calibration().threshold(), -2.0);
    }

    #[test]
    fn test_empty_is_degenerate() {
        let err = PostureEstimator::default().lean_back_portion(&[]).unwrap_err();
        assert!(matches!(err, ContractError::DegenerateInput { len: 0, .. }));
    }
}
