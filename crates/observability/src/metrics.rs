//! 分析指标收集模块
//!
//! 记录 session 分析、采集批次与 sink 分发的运行指标，并在内存中汇总各统计量的分布。

use std::collections::BTreeMap;

use contracts::StatsRecord;
use metrics::{counter, gauge, histogram};

/// 记录一个 session 分析完成
///
/// 每个 `StatsRecord` 产生后调用一次，逐项写入直方图。
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_session_stats;
///
/// let record = session_stats(&session, &config)?;
/// record_session_stats(&record, elapsed.as_secs_f64() * 1000.0);
/// ```
pub fn record_session_stats(record: &StatsRecord, elapsed_ms: f64) {
    counter!("chair_stats_sessions_analyzed_total").increment(1);
    histogram!("chair_stats_session_analysis_ms").record(elapsed_ms);

    for (name, value) in &record.metrics {
        if value.is_finite() {
            histogram!("chair_stats_metric_value", "metric" => name.clone()).record(*value);
        } else {
            counter!("chair_stats_metric_non_finite_total", "metric" => name.clone())
                .increment(1);
        }
    }
}

/// 记录 session 分析失败 (按操作与错误类别)
pub fn record_session_failed(operation: &str, kind: &str) {
    counter!(
        "chair_stats_sessions_failed_total",
        "operation" => operation.to_string(),
        "kind" => kind.to_string()
    )
    .increment(1);
}

/// 记录预处理中丢弃的非有限样本
pub fn record_samples_dropped(session: &str, count: usize) {
    if count > 0 {
        counter!(
            "chair_stats_samples_dropped_total",
            "session" => session.to_string()
        )
        .increment(count as u64);
    }
}

/// 记录采集批次
pub fn record_batch_collected(batch_id: u64, samples: usize) {
    counter!("chair_stats_batches_collected_total").increment(1);
    gauge!("chair_stats_last_batch_id").set(batch_id as f64);
    histogram!("chair_stats_batch_samples").record(samples as f64);
}

/// 记录批次分发
pub fn record_batch_dispatched(sink_name: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "chair_stats_batches_dispatched_total",
        "sink" => sink_name.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// 记录 sink 队列深度
pub fn record_queue_depth(sink_name: &str, depth: usize) {
    gauge!(
        "chair_stats_sink_queue_depth",
        "sink" => sink_name.to_string()
    )
    .set(depth as f64);
}

/// 分析指标聚合器
///
/// 在内存中聚合每个统计量在所有 session 上的分布，便于输出摘要。
#[derive(Debug, Clone, Default)]
pub struct StatsMetricsAggregator {
    /// 成功分析的 session 数
    pub sessions_analyzed: u64,

    /// 失败的 session 数
    pub sessions_failed: u64,

    /// 各统计量分布
    pub metric_stats: BTreeMap<String, RunningStats>,

    /// 各错误类别次数
    pub failure_counts: BTreeMap<String, u64>,
}

impl StatsMetricsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新聚合统计
    pub fn update(&mut self, record: &StatsRecord) {
        self.sessions_analyzed += 1;
        for (name, value) in &record.metrics {
            self.metric_stats
                .entry(name.clone())
                .or_default()
                .push(*value);
        }
    }

    /// 记录一次失败
    pub fn record_failure(&mut self, kind: &str) {
        self.sessions_failed += 1;
        *self.failure_counts.entry(kind.to_string()).or_insert(0) += 1;
    }

    /// 生成摘要报告
    pub fn summary(&self) -> MetricsSummary {
        let total = self.sessions_analyzed + self.sessions_failed;
        MetricsSummary {
            sessions_analyzed: self.sessions_analyzed,
            sessions_failed: self.sessions_failed,
            failure_rate: if total > 0 {
                self.sessions_failed as f64 / total as f64 * 100.0
            } else {
                0.0
            },
            metrics: self
                .metric_stats
                .iter()
                .map(|(name, stats)| (name.clone(), StatsSummary::from(stats)))
                .collect(),
            failure_counts: self.failure_counts.clone(),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub sessions_analyzed: u64,
    pub sessions_failed: u64,
    pub failure_rate: f64,
    pub metrics: BTreeMap<String, StatsSummary>,
    pub failure_counts: BTreeMap<String, u64>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Chair Stats Summary ===")?;
        writeln!(f, "Sessions analyzed: {}", self.sessions_analyzed)?;
        writeln!(
            f,
            "Sessions failed: {} ({:.2}%)",
            self.sessions_failed, self.failure_rate
        )?;

        if !self.metrics.is_empty() {
            writeln!(f, "Metrics:")?;
            for (name, summary) in &self.metrics {
                writeln!(f, "  {}: {}", name, summary)?;
            }
        }

        if !self.failure_counts.is_empty() {
            writeln!(f, "Failures by kind:")?;
            for (kind, count) in &self.failure_counts {
                writeln!(f, "  {}: {}", kind, count)?;
            }
        }

        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub non_finite: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            non_finite: stats.non_finite,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")?;
        } else {
            write!(
                f,
                "min={:.4}, max={:.4}, mean={:.4}, std={:.4} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )?;
        }
        if self.non_finite > 0 {
            write!(f, " [{} NaN]", self.non_finite)?;
        }
        Ok(())
    }
}

/// 在线统计计算器 (Welford's algorithm)
///
/// 非有限值单独计数，不进入均值/方差。
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    non_finite: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        if !value.is_finite() {
            self.non_finite += 1;
            return;
        }
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// 有限样本数量
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 被跳过的 NaN/Inf 数量
    pub fn non_finite(&self) -> u64 {
        self.non_finite
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 样本方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
