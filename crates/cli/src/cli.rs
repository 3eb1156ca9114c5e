//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Chair Stats - posture and movement statistics from a 9-axis chair sensor
#[derive(Parser, Debug)]
#[command(
    name = "chair-stats",
    author,
    version,
    about = "Posture and movement statistics from a 9-axis chair sensor",
    long_about = "Computes per-session statistics (stationarity, calm/mess portions, \n\
                  oscillation, lean back, timing) over a folder of recorded chair \n\
                  sessions, and collects new sessions into configured sinks."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "CHAIR_STATS_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "CHAIR_STATS_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute the full statistics record of every session
    Analyze(AnalyzeArgs),

    /// Non-stationary portion per channel, joined with the participants table
    Stationarity(StationarityArgs),

    /// Portion of exact zeros per channel (sensor dropout check)
    Zeros(DiagnosticArgs),

    /// Sampling interval and batch gap diagnostics
    Timing(DiagnosticArgs),

    /// Collect batches from the simulated chair into the configured sinks
    Collect(CollectArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Configuration file argument shared by all commands
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "config.toml", env = "CHAIR_STATS_CONFIG")]
    pub config: PathBuf,
}

/// Arguments for the `analyze` command
#[derive(Parser, Debug, Clone)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Keep only the four headline metrics under their display names
    #[arg(long)]
    pub truncated: bool,

    /// Override the stationarity sigma multiplier
    #[arg(long, env = "CHAIR_STATS_K_SIGMA")]
    pub k_sigma: Option<f64>,

    /// Output directory (defaults to dataset.output_dir)
    #[arg(long, env = "CHAIR_STATS_OUT")]
    pub out: Option<PathBuf>,

    /// Also write the records as JSON
    #[arg(long)]
    pub json: bool,

    /// Drop samples with NaN/Inf values before analysis
    #[arg(long, env = "CHAIR_STATS_DROP_NON_FINITE")]
    pub drop_non_finite: bool,

    /// Prometheus metrics port (0 = disabled)
    #[arg(long, default_value = "0", env = "CHAIR_STATS_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `stationarity` command
#[derive(Parser, Debug, Clone)]
pub struct StationarityArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Override the stationarity sigma multiplier
    #[arg(long, env = "CHAIR_STATS_K_SIGMA")]
    pub k_sigma: Option<f64>,

    /// Output directory (defaults to dataset.output_dir)
    #[arg(long, env = "CHAIR_STATS_OUT")]
    pub out: Option<PathBuf>,
}

/// Arguments for the `zeros` and `timing` commands
#[derive(Parser, Debug, Clone)]
pub struct DiagnosticArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Output directory (defaults to dataset.output_dir)
    #[arg(long, env = "CHAIR_STATS_OUT")]
    pub out: Option<PathBuf>,

    /// Print the records as JSON instead of writing a CSV
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `collect` command
#[derive(Parser, Debug, Clone)]
pub struct CollectArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Number of batches (defaults to collector.max_time / collector.timestep_send)
    #[arg(long, env = "CHAIR_STATS_BATCHES")]
    pub batches: Option<usize>,

    /// Override collector.person_id
    #[arg(long, env = "CHAIR_STATS_PERSON")]
    pub person: Option<String>,

    /// Seed of the simulated chair
    #[arg(long, default_value = "42", env = "CHAIR_STATS_SEED")]
    pub seed: u64,

    /// Simulate a lean back every N reads (0 = never)
    #[arg(long, default_value = "0")]
    pub lean_back_every: u64,

    /// Batch channel buffer size
    #[arg(long, default_value = "4", env = "CHAIR_STATS_BUFFER_SIZE")]
    pub buffer_size: usize,

    /// Collection timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "CHAIR_STATS_TIMEOUT")]
    pub timeout: u64,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show sink configuration
    #[arg(long)]
    pub sinks: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_analyze_flags() {
        let cli = Cli::try_parse_from([
            "chair-stats",
            "-v",
            "analyze",
            "-c",
            "cfg.toml",
            "--truncated",
            "--k-sigma",
            "2.5",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Analyze(args) => {
                assert_eq!(args.config.config, PathBuf::from("cfg.toml"));
                assert!(args.truncated);
                assert_eq!(args.k_sigma, Some(2.5));
                assert_eq!(args.metrics_port, 0);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["chair-stats", "-q", "-v", "info"]).is_err());
    }
}
