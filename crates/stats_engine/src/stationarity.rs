//! Outlier-based stationarity: share of samples outside `mean ± k·σ`.

use std::collections::BTreeMap;

use contracts::{Channel, ContractError, StationarityConfig};

use crate::frame::TimeSeriesFrame;
use crate::numeric::{mean, sample_std};

/// Output key of one channel's portion
pub fn metric_key(channel: Channel) -> String {
    format!("{channel}__nonstationary_portion")
}

#[derive(Debug, Clone)]
pub struct StationarityEstimator {
    n_sigma: f64,
    channels: Vec<Channel>,
}

impl StationarityEstimator {
    pub fn new(n_sigma: f64, channels: Vec<Channel>) -> Self {
        Self { n_sigma, channels }
    }

    pub fn from_config(config: &StationarityConfig) -> Self {
        Self::new(config.n_sigma, config.channels.clone())
    }

    /// Same channel set, different sigma multiplier
    pub fn with_sigma(mut self, n_sigma: f64) -> Self {
        self.n_sigma = n_sigma;
        self
    }

    pub fn n_sigma(&self) -> f64 {
        self.n_sigma
    }

    /// Portion of `values` strictly outside `mean ± n_sigma·σ` (σ with ddof 1).
    ///
    /// Fewer than 2 samples or σ = 0 gives exactly 0: a zero-width band
    /// cannot be exceeded under strict inequality. Non-finite input gives NaN.
    pub fn portion(&self, values: &[f64]) -> f64 {
        if values.len() < 2 {
            return 0.0;
        }
        let mu = mean(values);
        let sigma = sample_std(values);
        if !mu.is_finite() || !sigma.is_finite() {
            return f64::NAN;
        }
        if sigma == 0.0 {
            return 0.0;
        }
        let lower = mu - self.n_sigma * sigma;
        let upper = mu + self.n_sigma * sigma;
        let outside = values.iter().filter(|&&v| v < lower || v > upper).count();
        outside as f64 / values.len() as f64
    }

    /// Portion for every configured channel.
    ///
    /// # Errors
    /// `MissingChannel` if a configured channel was not recorded.
    pub fn estimate(
        &self,
        frame: &TimeSeriesFrame<'_>,
    ) -> Result<BTreeMap<Channel, f64>, ContractError> {
        self.channels
            .iter()
            .map(|&channel| Ok((channel, self.portion(frame.channel(channel)?))))
            .collect()
    }

    /// Like [`estimate`](Self::estimate), keyed by `{channel}__nonstationary_portion`
    pub fn metrics(
        &self,
        frame: &TimeSeriesFrame<'_>,
    ) -> Result<BTreeMap<String, f64>, ContractError> {
        Ok(self
            .estimate(frame)?
            .into_iter()
            .map(|(channel, value)| (metric_key(channel), value))
            .collect())
    }
}

impl Default for StationarityEstimator {
    fn default() -> Self {
        Self::from_config(&StationarityConfig::default())
    }
}
