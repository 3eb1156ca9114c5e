//! `analyze` command implementation.

use anyhow::{Context, Result};
use std::time::Instant;
use tracing::info;

use crate::cli::AnalyzeArgs;
use crate::pipeline::{load_blueprint, load_corpus, output_dir, summarize};

/// Results table of the full statistics
pub const STATS_FILE: &str = "chair_stats.csv";
/// Results joined with the participants table
pub const STATS_MERGED_FILE: &str = "chair_stats_merged.csv";
pub const STATS_JSON_FILE: &str = "chair_stats.json";

/// Execute the `analyze` command
pub fn run_analyze(args: &AnalyzeArgs) -> Result<()> {
    let started = Instant::now();
    let blueprint = load_blueprint(&args.config.config)?;

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
    }

    let dataset = load_corpus(&blueprint, args.drop_non_finite)?;
    info!(sessions = dataset.corpus.len(), k_sigma = ?args.k_sigma, "Analyzing corpus");

    let report = stats_engine::corpus_stats(&dataset.corpus, &blueprint.analysis, args.k_sigma);
    let mut stats = summarize("analyze", &dataset, &report, started);
    let view = if args.truncated {
        report.truncated()
    } else {
        report
    };

    let out_dir = output_dir(&blueprint, args.out.as_deref());

    let table = view.table();
    let stats_path = out_dir.join(STATS_FILE);
    dispatcher::write_results_csv(&stats_path, &table)
        .with_context(|| format!("Failed to write {}", stats_path.display()))?;
    stats.outputs.push(stats_path);

    if let Some(participants) = ingestion::load_configured(&blueprint.dataset)? {
        let merged = table.inner_join(&participants);
        info!(
            participants = participants.len(),
            matched = merged.len(),
            "Joined with participants"
        );
        let merged_path = out_dir.join(STATS_MERGED_FILE);
        dispatcher::write_merged_csv(&merged_path, &merged)?;
        stats.outputs.push(merged_path);
    }

    if args.json {
        let json_path = out_dir.join(STATS_JSON_FILE);
        dispatcher::write_results_json(&json_path, &view.records)?;
        stats.outputs.push(json_path);
    }

    stats.duration = started.elapsed();
    stats.print_summary();
    Ok(())
}
