//! `info` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use contracts::ChairBlueprint;

use crate::cli::InfoArgs;
use crate::pipeline::load_blueprint;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    dataset: DatasetInfo,
    analysis: AnalysisInfo,
    collector: CollectorInfo,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sinks: Vec<SinkInfo>,
}

#[derive(Serialize)]
struct DatasetInfo {
    data_path: String,
    chair_file_prefix: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    participants_path: Option<String>,
    output_dir: String,
    raw_counts: bool,
}

#[derive(Serialize)]
struct AnalysisInfo {
    measurement_interval: f64,
    measurements_per_batch: usize,
    stationarity_n_sigma: f64,
    stationarity_channels: Vec<String>,
    acc_percentile_to_crop: f64,
    acc_n_sigma: f64,
    mag_weight: f64,
    mag_max_calm_derivative: f64,
    lean_back_threshold: f64,
    oscillation_composite: String,
}

#[derive(Serialize)]
struct CollectorInfo {
    timestep_detect: f64,
    timestep_send: f64,
    max_time: f64,
    samples_per_batch: usize,
    batch_count: usize,
    #[serde(skip_serializing_if = "String::is_empty")]
    person_id: String,
}

#[derive(Serialize)]
struct SinkInfo {
    name: String,
    sink_type: String,
    queue_capacity: usize,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.config.display(), "Loading configuration info");

    let blueprint = load_blueprint(&args.config.config)
        .with_context(|| format!("Failed to load config from {}", args.config.config.display()))?;

    if args.json {
        let info = build_config_info(&blueprint, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args);
    }

    Ok(())
}

fn build_config_info(blueprint: &ChairBlueprint, args: &InfoArgs) -> ConfigInfo {
    let dataset = &blueprint.dataset;
    let analysis = &blueprint.analysis;
    let collector = &blueprint.collector;

    let sinks = if args.sinks {
        blueprint
            .sinks
            .iter()
            .map(|s| SinkInfo {
                name: s.name.clone(),
                sink_type: format!("{:?}", s.sink_type),
                queue_capacity: s.queue_capacity,
            })
            .collect()
    } else {
        Vec::new()
    };

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        dataset: DatasetInfo {
            data_path: dataset.data_path.display().to_string(),
            chair_file_prefix: dataset.chair_file_prefix.clone(),
            participants_path: dataset
                .participants_path
                .as_ref()
                .map(|p| p.display().to_string()),
            output_dir: dataset.output_dir.display().to_string(),
            raw_counts: dataset.raw_counts,
        },
        analysis: AnalysisInfo {
            measurement_interval: analysis.measurement_interval,
            measurements_per_batch: analysis.measurements_per_batch,
            stationarity_n_sigma: analysis.stationarity.n_sigma,
            stationarity_channels: analysis
                .stationarity
                .channels
                .iter()
                .map(|c| c.name().to_string())
                .collect(),
            acc_percentile_to_crop: analysis.acc_calm.percentile_to_crop,
            acc_n_sigma: analysis.acc_calm.n_sigma,
            mag_weight: analysis.mag_calm.weight,
            mag_max_calm_derivative: analysis.mag_calm.max_calm_derivative,
            lean_back_threshold: analysis.posture.threshold(),
            oscillation_composite: format!("{:?}", analysis.oscillation_composite),
        },
        collector: CollectorInfo {
            timestep_detect: collector.timestep_detect,
            timestep_send: collector.timestep_send,
            max_time: collector.max_time,
            samples_per_batch: collector.samples_per_batch(),
            batch_count: collector.batch_count(),
            person_id: collector.person_id.clone(),
        },
        sinks,
    }
}

fn print_config_info(blueprint: &ChairBlueprint, args: &InfoArgs) {
    let dataset = &blueprint.dataset;
    let analysis = &blueprint.analysis;
    let collector = &blueprint.collector;

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                 Chair Stats Configuration                    ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("📂 Dataset");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!("   ├─ Data path: {}", dataset.data_path.display());
    println!("   ├─ Chair file prefix: {}", dataset.chair_file_prefix);
    match &dataset.participants_path {
        Some(path) => println!("   ├─ Participants: {}", path.display()),
        None => println!("   ├─ Participants: (none)"),
    }
    println!("   └─ Output dir: {}", dataset.output_dir.display());

    println!("\n📐 Analysis");
    println!(
        "   ├─ Sampling: {}s, {} per batch",
        analysis.measurement_interval, analysis.measurements_per_batch
    );
    println!(
        "   ├─ Stationarity: {}σ over {} channels",
        analysis.stationarity.n_sigma,
        analysis.stationarity.channels.len()
    );
    println!(
        "   ├─ Accelerometer calm: crop {}%, {}σ",
        analysis.acc_calm.percentile_to_crop, analysis.acc_calm.n_sigma
    );
    println!(
        "   ├─ Magnetometer calm: weight {}, |d| < {}",
        analysis.mag_calm.weight, analysis.mag_calm.max_calm_derivative
    );
    println!("   └─ Lean back below acc_z = {:.4}", analysis.posture.threshold());

    println!("\n⏱  Collector");
    println!(
        "   ├─ Detect every {}s, send every {}s",
        collector.timestep_detect, collector.timestep_send
    );
    println!(
        "   └─ {} batches x {} samples",
        collector.batch_count(),
        collector.samples_per_batch()
    );

    if !blueprint.sinks.is_empty() {
        println!("\n📤 Sinks ({})", blueprint.sinks.len());
        for (i, sink) in blueprint.sinks.iter().enumerate() {
            let prefix = if i == blueprint.sinks.len() - 1 { "└─" } else { "├─" };
            if args.sinks {
                println!(
                    "   {} {} ({:?}, queue {}) {:?}",
                    prefix, sink.name, sink.sink_type, sink.queue_capacity, sink.params
                );
            } else {
                println!("   {} {} ({:?})", prefix, sink.name, sink.sink_type);
            }
        }
    }

    println!();
}
