//! 配置校验模块
//!
//! 校验规则：
//! - 所有 sigma 倍数有限且 >= 0
//! - 0 <= percentile_to_crop < 50
//! - 样条权重 > 0，姿态标定 acc_z_std > 0
//! - measurement_interval > 0, measurements_per_batch >= 1
//! - stationarity 通道列表非空且无重复
//! - 采集周期 > 0 且 timestep_send >= timestep_detect
//! - sink 名称非空且唯一

use std::collections::HashSet;

use contracts::{AnalysisConfig, ChairBlueprint, CollectorConfig, ContractError, SinkType};

/// 校验 ChairBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &ChairBlueprint) -> Result<(), ContractError> {
    validate_dataset(blueprint)?;
    validate_analysis(&blueprint.analysis)?;
    validate_collector(&blueprint.collector)?;
    validate_sinks(blueprint)?;
    Ok(())
}

fn validate_dataset(blueprint: &ChairBlueprint) -> Result<(), ContractError> {
    let dataset = &blueprint.dataset;
    if dataset.chair_file_prefix.is_empty() || dataset.chair_file_prefix.contains('_') {
        return Err(ContractError::config_validation(
            "dataset.chair_file_prefix",
            format!(
                "prefix must be non-empty and contain no '_', got '{}'",
                dataset.chair_file_prefix
            ),
        ));
    }
    if dataset.participants_path.is_some() && dataset.skill_column.trim().is_empty() {
        return Err(ContractError::config_validation(
            "dataset.skill_column",
            "skill_column cannot be empty when participants_path is set",
        ));
    }
    Ok(())
}

fn check_sigma(field: &str, value: f64) -> Result<(), ContractError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ContractError::config_validation(
            field,
            format!("n_sigma must be finite and >= 0, got {value}"),
        ));
    }
    Ok(())
}

fn check_positive(field: &str, value: f64) -> Result<(), ContractError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ContractError::config_validation(
            field,
            format!("value must be finite and > 0, got {value}"),
        ));
    }
    Ok(())
}

/// 校验分析参数
fn validate_analysis(analysis: &AnalysisConfig) -> Result<(), ContractError> {
    check_positive("analysis.measurement_interval", analysis.measurement_interval)?;
    if analysis.measurements_per_batch == 0 {
        return Err(ContractError::config_validation(
            "analysis.measurements_per_batch",
            "measurements_per_batch must be >= 1",
        ));
    }

    check_sigma("analysis.stationarity.n_sigma", analysis.stationarity.n_sigma)?;
    if analysis.stationarity.channels.is_empty() {
        return Err(ContractError::config_validation(
            "analysis.stationarity.channels",
            "channel list cannot be empty",
        ));
    }
    let mut seen = HashSet::new();
    for channel in &analysis.stationarity.channels {
        if !seen.insert(channel) {
            return Err(ContractError::config_validation(
                format!("analysis.stationarity.channels[{channel}]"),
                "duplicate channel",
            ));
        }
    }

    let acc = &analysis.acc_calm;
    check_sigma("analysis.acc_calm.n_sigma", acc.n_sigma)?;
    if !(0.0..50.0).contains(&acc.percentile_to_crop) {
        return Err(ContractError::config_validation(
            "analysis.acc_calm.percentile_to_crop",
            format!(
                "percentile_to_crop must be in [0, 50), got {}",
                acc.percentile_to_crop
            ),
        ));
    }
    check_positive("analysis.acc_calm.oscillation_scale", acc.oscillation_scale)?;

    check_positive("analysis.mag_calm.weight", analysis.mag_calm.weight)?;
    check_positive(
        "analysis.mag_calm.max_calm_derivative",
        analysis.mag_calm.max_calm_derivative,
    )?;

    let posture = &analysis.posture;
    check_sigma("analysis.posture.n_sigma", posture.n_sigma)?;
    check_positive("analysis.posture.acc_z_std", posture.acc_z_std)?;
    if !posture.acc_z_mean.is_finite() {
        return Err(ContractError::config_validation(
            "analysis.posture.acc_z_mean",
            "acc_z_mean must be finite",
        ));
    }
    Ok(())
}

/// 校验采集周期
fn validate_collector(collector: &CollectorConfig) -> Result<(), ContractError> {
    check_positive("collector.timestep_detect", collector.timestep_detect)?;
    check_positive("collector.timestep_send", collector.timestep_send)?;
    check_positive("collector.max_time", collector.max_time)?;
    if collector.timestep_send < collector.timestep_detect {
        return Err(ContractError::config_validation(
            "collector.timestep_detect / collector.timestep_send",
            format!(
                "timestep_send ({}) must be >= timestep_detect ({})",
                collector.timestep_send, collector.timestep_detect
            ),
        ));
    }
    Ok(())
}

/// 校验 sink 配置
fn validate_sinks(blueprint: &ChairBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, sink) in blueprint.sinks.iter().enumerate() {
        if sink.name.is_empty() {
            return Err(ContractError::config_validation(
                format!("sinks[{}].name", idx),
                "sink name cannot be empty",
            ));
        }
        if !seen.insert(sink.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("sinks[name={}]", sink.name),
                "duplicate sink name",
            ));
        }
        if sink.queue_capacity == 0 {
            return Err(ContractError::config_validation(
                format!("sinks[{}].queue_capacity", sink.name),
                "queue_capacity must be >= 1",
            ));
        }
        if sink.sink_type == SinkType::Network && !sink.params.contains_key("url") {
            return Err(ContractError::config_validation(
                format!("sinks[{}].params.url", sink.name),
                "network sink requires 'url'",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{Channel, ConfigVersion, DatasetConfig, SinkConfig};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn minimal_blueprint() -> ChairBlueprint {
        ChairBlueprint {
            version: ConfigVersion::V1,
            dataset: DatasetConfig {
                data_path: PathBuf::from("../CSV"),
                chair_file_prefix: "schairlog".into(),
                participants_path: None,
                participants_delimiter: ';',
                skill_column: "Skill".into(),
                output_dir: PathBuf::from("out"),
                raw_counts: false,
            },
            analysis: AnalysisConfig::default(),
            collector: CollectorConfig::default(),
            sinks: vec![SinkConfig {
                name: "log".into(),
                sink_type: SinkType::Log,
                queue_capacity: 16,
                params: Default::default(),
            }],
        }
    }

    fn err_of(bp: &ChairBlueprint) -> String {
        let result = validate(bp);
        assert!(result.is_err());
        result.unwrap_err().to_string()
    }

    #[test]
    fn test_valid_config() {
        let bp = minimal_blueprint();
        assert!(validate(&bp).is_ok());
    }

    #[test]
    fn test_negative_sigma() {
        let mut bp = minimal_blueprint();
        bp.analysis.stationarity.n_sigma = -1.0;
        let err = err_of(&bp);
        assert!(err.contains("analysis.stationarity.n_sigma"), "got: {err}");

        let mut bp = minimal_blueprint();
        bp.analysis.acc_calm.n_sigma = f64::NAN;
        let err = err_of(&bp);
        assert!(err.contains("analysis.acc_calm.n_sigma"), "got: {err}");
    }

    #[test]
    fn test_zero_sigma_is_allowed() {
        let mut bp = minimal_blueprint();
        bp.analysis.posture.n_sigma = 0.0;
        assert!(validate(&bp).is_ok());
    }

    #[test]
    fn test_percentile_range() {
        let mut bp = minimal_blueprint();
        bp.analysis.acc_calm.percentile_to_crop = 50.0;
        let err = err_of(&bp);
        assert!(err.contains("percentile_to_crop"), "got: {err}");
    }

    #[test]
    fn test_duplicate_stationarity_channel() {
        let mut bp = minimal_blueprint();
        bp.analysis.stationarity.channels = vec![Channel::ACC_X, Channel::ACC_X];
        let err = err_of(&bp);
        assert!(err.contains("duplicate channel"), "got: {err}");

        bp.analysis.stationarity.channels.clear();
        let err = err_of(&bp);
        assert!(err.contains("cannot be empty"), "got: {err}");
    }

    #[test]
    fn test_weight_and_calibration_positive() {
        let mut bp = minimal_blueprint();
        bp.analysis.mag_calm.weight = 0.0;
        assert!(err_of(&bp).contains("analysis.mag_calm.weight"));

        let mut bp = minimal_blueprint();
        bp.analysis.posture.acc_z_std = -30.0;
        assert!(err_of(&bp).contains("acc_z_std"));
    }

    #[test]
    fn test_batch_size() {
        let mut bp = minimal_blueprint();
        bp.analysis.measurements_per_batch = 0;
        assert!(err_of(&bp).contains("measurements_per_batch"));
    }

    #[test]
    fn test_collector_timesteps() {
        let mut bp = minimal_blueprint();
        bp.collector.timestep_send = 0.001;
        let err = err_of(&bp);
        assert!(err.contains("timestep_send"), "got: {err}");
    }

    #[test]
    fn test_sink_names() {
        let mut bp = minimal_blueprint();
        bp.sinks[0].name = String::new();
        assert!(err_of(&bp).contains("cannot be empty"));

        let mut bp = minimal_blueprint();
        bp.sinks.push(bp.sinks[0].clone());
        assert!(err_of(&bp).contains("duplicate sink name"));
    }

    #[test]
    fn test_network_sink_needs_url() {
        let mut bp = minimal_blueprint();
        bp.sinks.push(SinkConfig {
            name: "upload".into(),
            sink_type: SinkType::Network,
            queue_capacity: 16,
            params: HashMap::new(),
        });
        assert!(err_of(&bp).contains("url"));
    }

    #[test]
    fn test_prefix_without_underscore() {
        let mut bp = minimal_blueprint();
        bp.dataset.chair_file_prefix = "schair_log".into();
        assert!(err_of(&bp).contains("chair_file_prefix"));
    }
}
