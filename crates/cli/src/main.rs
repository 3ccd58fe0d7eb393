//! # reqd
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 配置加载、合并与交互式补全
//! - 并发请求分发与进度显示
//! - 优雅关闭处理

mod cli;
mod commands;
mod error;
mod progress;
mod summary;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::info;

use cli::Cli;
use commands::run_dispatch;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_logging(&cli)?;

    info!(version = env!("CARGO_PKG_VERSION"), "reqd starting");

    let result = run_dispatch(&cli).await;

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

/// Initialize logging and metrics based on CLI options
fn init_logging(cli: &Cli) -> Result<()> {
    observability::init_with_config(ObservabilityConfig::from_flags(
        cli.log_format.into(),
        cli.quiet,
        cli.verbose,
        cli.metrics_port,
    ))
}
