//! # Observability
//!
//! reqd 的日志与指标：tracing 输出到 stderr（stdout 留给摘要），
//! 可选的 Prometheus 端点暴露请求、传输错误与日志写入计数。

pub mod metrics;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

pub use crate::metrics::{
    record_exchange, record_job_abandoned, record_sink_write, record_transport_error,
    LatencyStats, RunningStats, StatsSummary,
};

/// 日志与指标配置
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub log_format: LogFormat,
    /// Prometheus 端口 (None = 禁用)
    pub metrics_port: Option<u16>,
    /// RUST_LOG 未设置时使用的级别
    pub default_log_level: String,
}

impl ObservabilityConfig {
    /// 由命令行开关推导：`quiet` 只保留警告，`verbose` 每级提升一档，端口 0 表示禁用指标
    pub fn from_flags(log_format: LogFormat, quiet: bool, verbose: u8, metrics_port: u16) -> Self {
        let level = match (quiet, verbose) {
            (true, _) => "warn",
            (false, 0) => "info",
            (false, 1) => "debug",
            (false, _) => "trace",
        };
        Self {
            log_format,
            metrics_port: (metrics_port != 0).then_some(metrics_port),
            default_log_level: level.to_string(),
        }
    }
}

/// 日志格式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
    Compact,
}

fn fmt_layer(format: LogFormat) -> Box<dyn Layer<Registry> + Send + Sync> {
    let layer = fmt::layer().with_writer(std::io::stderr);
    match format {
        LogFormat::Json => layer
            .json()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        LogFormat::Pretty => layer.pretty().boxed(),
        LogFormat::Compact => layer.compact().boxed(),
    }
}

/// 安装全局 subscriber，并在配置了端口时启动 Prometheus 端点
pub fn init_with_config(config: ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_log_level));

    tracing_subscriber::registry()
        .with(fmt_layer(config.log_format))
        .with(filter)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    if let Some(port) = config.metrics_port {
        PrometheusBuilder::new()
            .with_http_listener(([0, 0, 0, 0], port))
            .install()
            .context("Failed to install Prometheus recorder")?;
        tracing::info!(port, "Prometheus metrics endpoint listening");
    }

    tracing::debug!(
        log_format = ?config.log_format,
        level = %config.default_log_level,
        "Logging initialized"
    );
    Ok(())
}
