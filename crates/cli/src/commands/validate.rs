//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use contracts::ChairBlueprint;

use crate::cli::ValidateArgs;
use crate::pipeline::load_blueprint;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    data_path: String,
    stationarity_channels: usize,
    samples_per_batch: usize,
    batch_count: usize,
    sink_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.config.display().to_string();

    match load_blueprint(&args.config.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    data_path: blueprint.dataset.data_path.display().to_string(),
                    stationarity_channels: blueprint.analysis.stationarity.channels.len(),
                    samples_per_batch: blueprint.collector.samples_per_batch(),
                    batch_count: blueprint.collector.batch_count(),
                    sink_count: blueprint.sinks.len(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &ChairBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();
    let dataset = &blueprint.dataset;

    if !dataset.data_path.is_dir() {
        warnings.push(format!(
            "dataset.data_path '{}' is not a directory",
            dataset.data_path.display()
        ));
    }

    match &dataset.participants_path {
        Some(path) if !path.is_file() => warnings.push(format!(
            "dataset.participants_path '{}' does not exist - joins will fail",
            path.display()
        )),
        None => warnings.push(
            "dataset.participants_path not set - merged tables will not be written".to_string(),
        ),
        Some(_) => {}
    }

    if blueprint.sinks.is_empty() {
        warnings.push("No sinks configured - collected batches will be dropped".to_string());
    }

    if blueprint.collector.batch_count() == 0 {
        warnings.push(
            "collector.max_time < collector.timestep_send - collect sends no batch".to_string(),
        );
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Dataset: {}", summary.data_path);
            println!("  Stationarity channels: {}", summary.stationarity_channels);
            println!(
                "  Collector: {} batches x {} samples",
                summary.batch_count, summary.samples_per_batch
            );
            println!("  Sinks: {}", summary.sink_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
