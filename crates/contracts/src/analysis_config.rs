//! Analysis configuration contracts shared by the loader, the engine and the CLI.

use serde::{Deserialize, Serialize};

use crate::Channel;

/// Full analysis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Nominal sampling interval of the recorder (seconds)
    #[serde(default = "default_measurement_interval")]
    pub measurement_interval: f64,

    /// Samples per transmitted batch (B in the timing diagnostics)
    #[serde(default = "default_measurements_per_batch")]
    pub measurements_per_batch: usize,

    /// Which value is reported as `oscillation_acc`
    #[serde(default)]
    pub oscillation_composite: OscillationComposite,

    #[serde(default)]
    pub stationarity: StationarityConfig,

    #[serde(default)]
    pub acc_calm: AccCalmConfig,

    #[serde(default)]
    pub mag_calm: MagCalmConfig,

    #[serde(default)]
    pub posture: PostureCalibration,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            measurement_interval: default_measurement_interval(),
            measurements_per_batch: default_measurements_per_batch(),
            oscillation_composite: OscillationComposite::default(),
            stationarity: StationarityConfig::default(),
            acc_calm: AccCalmConfig::default(),
            mag_calm: MagCalmConfig::default(),
            posture: PostureCalibration::default(),
        }
    }
}

fn default_measurement_interval() -> f64 {
    0.01
}

fn default_measurements_per_batch() -> usize {
    1000
}

/// Outlier-based stationarity check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationarityConfig {
    /// Band half-width in standard deviations
    #[serde(default = "default_stationarity_sigma")]
    pub n_sigma: f64,

    /// Channels checked by default (accelerometer and gyroscope)
    #[serde(default = "default_stationarity_channels")]
    pub channels: Vec<Channel>,
}

impl Default for StationarityConfig {
    fn default() -> Self {
        Self {
            n_sigma: default_stationarity_sigma(),
            channels: default_stationarity_channels(),
        }
    }
}

fn default_stationarity_sigma() -> f64 {
    3.0
}

fn default_stationarity_channels() -> Vec<Channel> {
    vec![
        Channel::ACC_X,
        Channel::ACC_Y,
        Channel::ACC_Z,
        Channel::GYRO_X,
        Channel::GYRO_Y,
        Channel::GYRO_Z,
    ]
}

/// Percentile-trimmed calm band for the accelerometer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccCalmConfig {
    /// Percentile cut from each tail before estimating spread
    #[serde(default = "default_percentile_to_crop")]
    pub percentile_to_crop: f64,

    #[serde(default = "default_acc_sigma")]
    pub n_sigma: f64,

    /// Divisor of the oscillation index (together with `n_sigma`)
    #[serde(default = "default_oscillation_scale")]
    pub oscillation_scale: f64,
}

impl Default for AccCalmConfig {
    fn default() -> Self {
        Self {
            percentile_to_crop: default_percentile_to_crop(),
            n_sigma: default_acc_sigma(),
            oscillation_scale: default_oscillation_scale(),
        }
    }
}

fn default_percentile_to_crop() -> f64 {
    10.0
}

fn default_acc_sigma() -> f64 {
    10.0
}

fn default_oscillation_scale() -> f64 {
    25.0
}

/// Smoothing-spline derivative threshold for the magnetometer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MagCalmConfig {
    /// Per-sample weight of the smoothing fit
    #[serde(default = "default_mag_weight")]
    pub weight: f64,

    /// A sample is calm while |derivative| stays below this
    #[serde(default = "default_max_calm_derivative")]
    pub max_calm_derivative: f64,
}

impl Default for MagCalmConfig {
    fn default() -> Self {
        Self {
            weight: default_mag_weight(),
            max_calm_derivative: default_max_calm_derivative(),
        }
    }
}

fn default_mag_weight() -> f64 {
    0.05
}

fn default_max_calm_derivative() -> f64 {
    30.0
}

/// Empirical upright-posture calibration of `acc_z` (raw counts)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostureCalibration {
    #[serde(default = "default_acc_z_mean")]
    pub acc_z_mean: f64,

    #[serde(default = "default_acc_z_std")]
    pub acc_z_std: f64,

    #[serde(default = "default_posture_sigma")]
    pub n_sigma: f64,
}

impl PostureCalibration {
    /// Readings below this are counted as leaning back
    pub fn threshold(&self) -> f64 {
        self.acc_z_mean - self.n_sigma * self.acc_z_std
    }
}

impl Default for PostureCalibration {
    fn default() -> Self {
        Self {
            acc_z_mean: default_acc_z_mean(),
            acc_z_std: default_acc_z_std(),
            n_sigma: default_posture_sigma(),
        }
    }
}

fn default_acc_z_mean() -> f64 {
    -15910.0
}

fn default_acc_z_std() -> f64 {
    30.0
}

fn default_posture_sigma() -> f64 {
    3.0
}

/// Source of the `oscillation_acc` value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OscillationComposite {
    /// z-axis oscillation (historical output)
    #[default]
    ZAxis,
    /// Mean of the x/y/z oscillations
    MeanOfAxes,
}
