//! Derivative-threshold calm detection on a smoothing spline.

use contracts::{ContractError, MagCalmConfig};

use super::{AxisCalm, CalmSegmentation};
use crate::spline::SmoothingSpline;

/// Smoothed curve and its derivative, for plotting one axis
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothedAxis {
    pub values: Vec<f64>,
    pub derivatives: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MagnetometerCalm {
    weight: f64,
    max_calm_derivative: f64,
}

impl MagnetometerCalm {
    pub fn new(weight: f64, max_calm_derivative: f64) -> Self {
        Self {
            weight,
            max_calm_derivative,
        }
    }

    pub fn from_config(config: &MagCalmConfig) -> Self {
        Self::new(config.weight, config.max_calm_derivative)
    }

    /// 拟合样条，返回平滑值与一阶导数（按样本序号）
    ///
    /// # Errors
    /// `DegenerateInput` for fewer than four samples.
    pub fn smoothed(&self, values: &[f64]) -> Result<SmoothedAxis, ContractError> {
        let spline = SmoothingSpline::fit_uniform(values, self.weight)?;
        Ok(SmoothedAxis {
            derivatives: spline.derivatives(),
            values: spline.values().to_vec(),
        })
    }
}

impl Default for MagnetometerCalm {
    fn default() -> Self {
        Self::from_config(&MagCalmConfig::default())
    }
}

impl CalmSegmentation for MagnetometerCalm {
    /// Calm iff `|g′(i)| < max_calm_derivative`; a NaN derivative is never calm.
    fn segment(&self, values: &[f64]) -> Result<AxisCalm, ContractError> {
        let smoothed = self.smoothed(values)?;
        let mask = smoothed
            .derivatives
            .iter()
            .map(|d| d.abs() < self.max_calm_derivative)
            .collect();
        Ok(AxisCalm {
            mask,
            oscillation: None,
        })
    }
}
