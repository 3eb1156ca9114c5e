//! ChairBlueprint - Config Loader 输出
//!
//! 描述完整的运行配置：数据集位置、分析参数、采集循环、输出路由。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::AnalysisConfig;

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 完整的配置蓝图
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChairBlueprint {
    /// 配置版本
    #[serde(default)]
    pub version: ConfigVersion,

    /// 数据集位置
    pub dataset: DatasetConfig,

    /// 分析参数
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// 采集循环
    #[serde(default)]
    pub collector: CollectorConfig,

    /// 输出路由配置
    #[serde(default)]
    pub sinks: Vec<SinkConfig>,
}

/// 数据集配置：一个子目录对应一个 session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// 根目录
    pub data_path: PathBuf,

    /// 椅子传感器文件前缀 (文件名第一个 '_' 之前的部分)
    #[serde(default = "default_chair_file_prefix")]
    pub chair_file_prefix: String,

    /// 参与者问卷 CSV (可选)
    #[serde(default)]
    pub participants_path: Option<PathBuf>,

    /// 问卷分隔符
    #[serde(default = "default_participants_delimiter")]
    pub participants_delimiter: char,

    /// 技能标签所在列 (原始问卷表头，含前导空格)
    #[serde(default = "default_skill_column")]
    pub skill_column: String,

    /// 结果输出目录
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// 加载时是否做 MPU9250 原始计数 -> 物理单位换算
    #[serde(default)]
    pub raw_counts: bool,
}

fn default_chair_file_prefix() -> String {
    "schairlog".to_string()
}

fn default_participants_delimiter() -> char {
    ';'
}

fn default_skill_column() -> String {
    " What experience do u have in shooter games (Counter-Strike, Doom, Battlefield, etc.)?"
        .to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("data/clean")
}

/// 采集循环配置 (秒)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// 采样周期
    #[serde(default = "default_timestep_detect")]
    pub timestep_detect: f64,

    /// 发送周期 (每个批次覆盖的时长)
    #[serde(default = "default_timestep_send")]
    pub timestep_send: f64,

    /// 总采集时长
    #[serde(default = "default_max_time")]
    pub max_time: f64,

    /// 批次附带的标签
    #[serde(default)]
    pub label: String,

    #[serde(default)]
    pub meta: String,

    #[serde(default)]
    pub person_id: String,
}

impl CollectorConfig {
    /// Samples per batch
    pub fn samples_per_batch(&self) -> usize {
        (self.timestep_send / self.timestep_detect).round().max(1.0) as usize
    }

    /// Number of batches in one run
    pub fn batch_count(&self) -> usize {
        (self.max_time / self.timestep_send).floor().max(0.0) as usize
    }
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            timestep_detect: default_timestep_detect(),
            timestep_send: default_timestep_send(),
            max_time: default_max_time(),
            label: String::new(),
            meta: String::new(),
            person_id: String::new(),
        }
    }
}

fn default_timestep_detect() -> f64 {
    0.01
}

fn default_timestep_send() -> f64 {
    10.0
}

fn default_max_time() -> f64 {
    60.0
}

/// Sink 输出配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Sink 名称
    pub name: String,

    /// Sink 类型
    pub sink_type: SinkType,

    /// 队列容量
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// 类型特定参数
    #[serde(default)]
    pub params: HashMap<String, String>,
}

fn default_queue_capacity() -> usize {
    16
}

/// Sink 类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// 日志输出
    Log,
    /// 文件输出 (数据集目录布局的 CSV)
    File,
    /// 网络输出 (HTTP JSON POST)
    Network,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collector_batch_arithmetic() {
        let collector = CollectorConfig::default();
        assert_eq!(collector.samples_per_batch(), 1000);
        assert_eq!(collector.batch_count(), 6);

        let short = CollectorConfig {
            timestep_detect: 0.5,
            timestep_send: 2.0,
            max_time: 5.0,
            ..CollectorConfig::default()
        };
        assert_eq!(short.samples_per_batch(), 4);
        assert_eq!(short.batch_count(), 2);
    }

    #[test]
    fn minimal_blueprint_uses_defaults() {
        let blueprint: ChairBlueprint =
            serde_json::from_str(r#"{"dataset":{"data_path":"../CSV"}}"#).unwrap();
        assert_eq!(blueprint.version, ConfigVersion::V1);
        assert_eq!(blueprint.dataset.chair_file_prefix, "schairlog");
        assert_eq!(blueprint.dataset.participants_delimiter, ';');
        assert!(blueprint.sinks.is_empty());
        assert_eq!(blueprint.analysis, AnalysisConfig::default());
    }
}
