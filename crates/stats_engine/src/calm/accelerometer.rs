//! Percentile-trimmed calm band.
//!
//! The tails are cut before estimating spread so that the movement events the
//! band is meant to detect do not widen the band itself.

use contracts::{AccCalmConfig, ContractError};

use super::{AxisCalm, CalmSegmentation};
use crate::numeric::{percentiles, population_std};

#[derive(Debug, Clone, PartialEq)]
pub struct AccelerometerCalm {
    percentile_to_crop: f64,
    n_sigma: f64,
    oscillation_scale: f64,
}

impl AccelerometerCalm {
    pub fn new(percentile_to_crop: f64, n_sigma: f64, oscillation_scale: f64) -> Self {
        Self {
            percentile_to_crop,
            n_sigma,
            oscillation_scale,
        }
    }

    pub fn from_config(config: &AccCalmConfig) -> Self {
        Self::new(
            config.percentile_to_crop,
            config.n_sigma,
            config.oscillation_scale,
        )
    }

    /// σ of the samples strictly inside `(lower, upper)`.
    ///
    /// When nothing lies strictly inside (heavily tied data) the inclusive
    /// range is used instead, so σ is always taken over a non-empty set.
    fn trimmed_std(values: &[f64], lower: f64, upper: f64) -> f64 {
        let strict: Vec<f64> = values
            .iter()
            .copied()
            .filter(|&v| lower < v && v < upper)
            .collect();
        if !strict.is_empty() {
            return population_std(&strict);
        }
        let inclusive: Vec<f64> = values
            .iter()
            .copied()
            .filter(|&v| lower <= v && v <= upper)
            .collect();
        population_std(&inclusive)
    }
}

impl Default for AccelerometerCalm {
    fn default() -> Self {
        Self::from_config(&AccCalmConfig::default())
    }
}

impl CalmSegmentation for AccelerometerCalm {
    /// Calm iff strictly inside `median ± n_sigma·σ_trimmed`;
    /// `oscillation = σ_trimmed / (oscillation_scale · n_sigma)`.
    ///
    /// With σ_trimmed = 0 the open band is empty and no sample is calm.
    fn segment(&self, values: &[f64]) -> Result<AxisCalm, ContractError> {
        let p = self.percentile_to_crop;
        let bounds = percentiles(values, &[p, 50.0, 100.0 - p])?;
        let (lower, median, upper) = (bounds[0], bounds[1], bounds[2]);

        if median.is_nan() {
            return Ok(AxisCalm {
                mask: vec![false; values.len()],
                oscillation: Some(f64::NAN),
            });
        }

        let sigma = Self::trimmed_std(values, lower, upper);
        let oscillation = sigma / (self.oscillation_scale * self.n_sigma);

        let half_width = self.n_sigma * sigma;
        let (lo, hi) = (median - half_width, median + half_width);
        let mask = values.iter().map(|&v| lo < v && v < hi).collect();

        Ok(AxisCalm {
            mask,
            oscillation: Some(oscillation),
        })
    }
}
