//! # vio-align CLI
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 配置加载与验证（配置文件或命令行参数）
//! - 多设备对齐编排与结果分发
//! - 优雅关闭处理

mod cli;
mod commands;
mod error;
mod pipeline;
mod plan;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_align, run_info, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let metrics_port = match &cli.command {
        Commands::Align(args) => args.metrics_port,
        _ => 0,
    };
    observability::init_with_config(
        ObservabilityConfig {
            log_format: cli.log_format.into(),
            ..Default::default()
        }
        .with_verbosity(cli.verbose, cli.quiet)
        .with_metrics_port(metrics_port),
    )?;

    info!(version = env!("CARGO_PKG_VERSION"), "vio-align starting");

    let result = match &cli.command {
        Commands::Align(args) => run_align(args).await,
        Commands::Validate(args) => run_validate(args),
        Commands::Info(args) => run_info(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}
