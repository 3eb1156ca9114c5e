//! `stationarity` command implementation.
//!
//! 输出三张表：各通道非平稳比例、清洗后的参与者表、两者按姓名的内连接。

use anyhow::Result;
use std::time::Instant;
use tracing::{info, warn};

use dispatcher::{MERGED_FILE, PARTICIPANTS_FILE, STATIONARITY_FILE};

use crate::cli::StationarityArgs;
use crate::pipeline::{load_blueprint, load_corpus, output_dir, summarize};

/// Execute the `stationarity` command
pub fn run_stationarity(args: &StationarityArgs) -> Result<()> {
    let started = Instant::now();
    let blueprint = load_blueprint(&args.config.config)?;
    let dataset = load_corpus(&blueprint, false)?;

    let report =
        stats_engine::corpus_stationarity(&dataset.corpus, &blueprint.analysis, args.k_sigma);
    let out_dir = output_dir(&blueprint, args.out.as_deref());
    let mut stats = summarize("stationarity", &dataset, &report, started);

    let table = report.table();
    let portions_path = out_dir.join(STATIONARITY_FILE);
    dispatcher::write_results_csv(&portions_path, &table)?;
    stats.outputs.push(portions_path);

    match ingestion::load_configured(&blueprint.dataset)? {
        Some(participants) => {
            let players_path = out_dir.join(PARTICIPANTS_FILE);
            dispatcher::write_participants_csv(&players_path, &participants)?;
            stats.outputs.push(players_path);

            let merged = table.inner_join(&participants);
            info!(matched = merged.len(), "Joined with participants");
            let merged_path = out_dir.join(MERGED_FILE);
            dispatcher::write_merged_csv(&merged_path, &merged)?;
            stats.outputs.push(merged_path);
        }
        None => warn!("dataset.participants_path not set - skipping participants tables"),
    }

    stats.duration = started.elapsed();
    stats.print_summary();
    Ok(())
}
