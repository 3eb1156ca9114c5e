//! `collect` command implementation.

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::info;

use ingestion::SimulatedChairConfig;

use crate::cli::CollectArgs;
use crate::pipeline::{load_blueprint, Pipeline, PipelineConfig};

/// Execute the `collect` command
pub async fn run_collect(args: &CollectArgs) -> Result<()> {
    let mut blueprint = load_blueprint(&args.config.config)?;

    if let Some(ref person) = args.person {
        info!(person = %person, "Overriding collector.person_id from CLI");
        blueprint.collector.person_id = person.clone();
    }

    let collector = &blueprint.collector;
    info!(
        person = %collector.person_id,
        timestep_detect = collector.timestep_detect,
        timestep_send = collector.timestep_send,
        batches = args.batches.unwrap_or_else(|| collector.batch_count()),
        sinks = blueprint.sinks.len(),
        "Starting collection"
    );

    let config = PipelineConfig {
        blueprint,
        batches: args.batches,
        timeout: (args.timeout != 0).then(|| Duration::from_secs(args.timeout)),
        buffer_size: args.buffer_size,
        chair: SimulatedChairConfig {
            seed: args.seed,
            lean_back_every: args.lean_back_every,
            lean_back_for: args.lean_back_every / 2,
            ..Default::default()
        },
        handle_signals: true,
    };

    let stats = Pipeline::new(config)
        .run()
        .await
        .context("Collection failed")?;

    stats.print_summary();
    Ok(())
}
