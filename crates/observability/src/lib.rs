//! # Observability
//!
//! 日志与指标。
//!
//! - `tracing` 订阅器：JSON / Pretty / Compact，写到 stderr
//!   (stdout 留给结果表与 JSON 输出)
//! - Prometheus 导出 (可选，分析是批处理，默认关闭)
//! - 统计量的内存汇总，见 [`metrics::StatsMetricsAggregator`]
//!
//! ## 使用示例
//!
//! ```ignore
//! let config = ObservabilityConfig::default().with_verbosity(cli.verbose, cli.quiet);
//! observability::init_with_config(config)?;
//!
//! metrics::record_session_stats(&record, elapsed_ms);
//! ```

pub mod metrics;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub use crate::metrics::{
    record_batch_collected, record_batch_dispatched, record_queue_depth, record_samples_dropped,
    record_session_failed, record_session_stats, MetricsSummary, RunningStats,
    StatsMetricsAggregator, StatsSummary,
};

/// 日志格式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
    Compact,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservabilityConfig {
    pub log_format: LogFormat,
    /// 未设置 `RUST_LOG` 时的级别
    pub log_level: String,
    /// 为 true 时忽略 `RUST_LOG` (`-q`)
    pub force_level: bool,
    /// Prometheus 端口 (None = 禁用)
    pub metrics_port: Option<u16>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::default(),
            log_level: "info".to_string(),
            force_level: false,
            metrics_port: None,
        }
    }
}

impl ObservabilityConfig {
    /// `-q` wins over any `-v`; `-v` debug, `-vv` and more trace.
    pub fn with_verbosity(mut self, verbose: u8, quiet: bool) -> Self {
        if quiet {
            self.log_level = "warn".to_string();
            self.force_level = true;
        } else {
            self.log_level = match verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
            .to_string();
        }
        self
    }

    pub fn with_format(mut self, log_format: LogFormat) -> Self {
        self.log_format = log_format;
        self
    }

    fn filter(&self) -> EnvFilter {
        if self.force_level {
            return EnvFilter::new(&self.log_level);
        }
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.log_level))
    }
}

/// Default config: pretty logs at `info`, no exporter
pub fn init() -> Result<()> {
    init_with_config(ObservabilityConfig::default())
}

/// Install the global subscriber, then the exporter if a port is set.
///
/// # Errors
/// A subscriber is already installed, or the exporter port cannot be bound.
pub fn init_with_config(config: ObservabilityConfig) -> Result<()> {
    let fmt_layer = match config.log_format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer().pretty().with_writer(std::io::stderr).boxed(),
        LogFormat::Compact => fmt::layer().compact().with_writer(std::io::stderr).boxed(),
    };

    tracing_subscriber::registry()
        .with(config.filter())
        .with(fmt_layer)
        .try_init()
        .context("tracing subscriber already installed")?;

    if let Some(port) = config.metrics_port {
        init_metrics_only(port)?;
    }

    tracing::debug!(
        log_format = ?config.log_format,
        log_level = %config.log_level,
        metrics_port = ?config.metrics_port,
        "observability ready"
    );
    Ok(())
}

/// Prometheus exporter on `0.0.0.0:port`, logging left untouched
///
/// # Errors
/// A recorder is already installed or the port is taken.
pub fn init_metrics_only(port: u16) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .with_context(|| format!("cannot serve Prometheus metrics on port {port}"))?;

    tracing::info!(port, "Prometheus metrics endpoint listening");
    Ok(())
}
