//! # Chair Stats CLI
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 配置加载与验证
//! - 数据集统计、平稳性与诊断表导出
//! - 模拟采集与 sink 分发

mod cli;
mod commands;
mod error;
mod pipeline;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use cli::{Cli, Commands};
use commands::{
    run_analyze, run_collect, run_info, run_stationarity, run_timing, run_validate, run_zeros,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_logging(&cli)?;

    info!(version = env!("CARGO_PKG_VERSION"), "Chair Stats CLI starting");

    let result = match &cli.command {
        Commands::Analyze(args) => run_analyze(args),
        Commands::Stationarity(args) => run_stationarity(args),
        Commands::Zeros(args) => run_zeros(args),
        Commands::Timing(args) => run_timing(args),
        Commands::Collect(args) => run_collect(args).await,
        Commands::Validate(args) => run_validate(args),
        Commands::Info(args) => run_info(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

/// Map CLI logging flags onto the observability config
fn init_logging(cli: &Cli) -> Result<()> {
    let format = match cli.log_format {
        cli::LogFormat::Json => observability::LogFormat::Json,
        cli::LogFormat::Pretty => observability::LogFormat::Pretty,
        cli::LogFormat::Compact => observability::LogFormat::Compact,
    };
    let config = observability::ObservabilityConfig::default()
        .with_format(format)
        .with_verbosity(cli.verbose, cli.quiet);
    observability::init_with_config(config)
}
