//! `zeros` and `timing` command implementations.

use anyhow::{Context, Result};
use std::time::Instant;

use stats_engine::CorpusReport;

use crate::cli::DiagnosticArgs;
use crate::pipeline::{load_blueprint, load_corpus, output_dir, summarize, LoadedDataset};

pub const ZEROS_FILE: &str = "zeros_portion.csv";
pub const TIMING_FILE: &str = "timing.csv";

/// Execute the `zeros` command
pub fn run_zeros(args: &DiagnosticArgs) -> Result<()> {
    run_diagnostic(args, "zeros", ZEROS_FILE, |dataset, _| {
        stats_engine::corpus_zeros(&dataset.corpus)
    })
}

/// Execute the `timing` command
pub fn run_timing(args: &DiagnosticArgs) -> Result<()> {
    run_diagnostic(args, "timing", TIMING_FILE, |dataset, analysis| {
        stats_engine::corpus_timing(&dataset.corpus, analysis)
    })
}

fn run_diagnostic(
    args: &DiagnosticArgs,
    operation: &'static str,
    file_name: &str,
    compute: impl FnOnce(&LoadedDataset, &contracts::AnalysisConfig) -> CorpusReport,
) -> Result<()> {
    let started = Instant::now();
    let blueprint = load_blueprint(&args.config.config)?;
    let dataset = load_corpus(&blueprint, false)?;

    let report = compute(&dataset, &blueprint.analysis);
    let mut stats = summarize(operation, &dataset, &report, started);

    if args.json {
        let json = serde_json::to_string_pretty(&report.records)
            .context("Failed to serialize records")?;
        println!("{}", json);
        return Ok(());
    }

    let path = output_dir(&blueprint, args.out.as_deref()).join(file_name);
    dispatcher::write_results_csv(&path, &report.table())?;
    stats.outputs.push(path);
    stats.duration = started.elapsed();
    stats.print_summary();
    Ok(())
}
