//! # Stats Engine
//!
//! 椅子九轴传感器统计引擎。
//!
//! 负责：
//! - 离群点平稳性检测
//! - 加速度计/磁力计 calm-mess 分段
//! - 后仰占比与采样时序诊断
//! - 汇总为每个 session 的 `StatsRecord`，并在语料库上并行批处理
//!
//! 所有统计都是 `(&Session, &AnalysisConfig)` 的纯函数，不修改输入。
//!
//! ## 使用示例
//!
//! ```ignore
//! use stats_engine::{corpus_stats, drop_non_finite, StatsAggregator};
//!
//! let (clean, dropped) = drop_non_finite(&session);
//! let record = StatsAggregator::new(config.clone()).session_stats(&clean, None)?;
//! println!("{:?}", record.truncated());
//!
//! let report = corpus_stats(&corpus, &config, Some(3.0));
//! for failure in &report.failures {
//!     eprintln!("{}: {}", failure.session, failure.message);
//! }
//! ```

mod aggregator;
pub mod calm;
mod corpus;
mod frame;
pub mod numeric;
mod posture;
mod preprocess;
pub mod spline;
mod stationarity;
mod timing;

pub use aggregator::{
    session_stats, truncated, zeros_portion, StatsAggregator, LEAN_BACK_PORTION,
    MESS_PORTION_ACC, MESS_PORTION_MAG, OSCILLATION_ACC,
};
pub use calm::{
    segment_family, strategy_for, AccelerometerCalm, AxisCalm, CalmSegmentation, FamilyCalm,
    MagnetometerCalm, SmoothedAxis,
};
pub use corpus::{
    corpus_stationarity, corpus_stats, corpus_timing, corpus_zeros, CorpusReport, SessionFailure,
};
pub use frame::TimeSeriesFrame;
pub use posture::PostureEstimator;
pub use preprocess::{drop_non_finite, scale_raw_counts, ScaleCoefficients};
pub use spline::SmoothingSpline;
pub use stationarity::{metric_key, StationarityEstimator};
pub use timing::{TimingDiagnostics, TimingReport, TIME_BETWEEN_BATCHES, TIME_BETWEEN_MEASUREMENTS};

// Re-export contracts types
pub use contracts::{AnalysisConfig, Corpus, Session, StatsRecord};
