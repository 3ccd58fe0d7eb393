//! CLI argument definitions using clap.

use clap::{Parser, ValueEnum};
use config_loader::RawConfig;
use std::path::PathBuf;

/// reqd - send a JSON array of request bodies to an HTTP endpoint concurrently
#[derive(Parser, Debug)]
#[command(
    name = "reqd",
    author,
    version,
    about = "Concurrent HTTP request dispatcher",
    long_about = "Sends every object of a JSON array as the body of one HTTP request.\n\n\
                  Requests are spread over a fixed pool of workers. Responses other than \n\
                  200 are counted as failures and can be logged verbatim; a transport \n\
                  error cancels the whole run.\n\n\
                  Values are taken from flags first, then from the config file \n\
                  (~/.reqd.conf by default), and anything still missing is prompted for."
)]
pub struct Cli {
    /// Number of concurrent workers
    #[arg(short = 'w', long, env = "REQD_WORKERS")]
    pub workers: Option<usize>,

    /// Target URL
    #[arg(short = 'u', long, env = "REQD_URL")]
    pub url: Option<String>,

    /// Path to the JSON input file (an array of objects)
    #[arg(short = 'f', long = "file", env = "REQD_DATA_FILE")]
    pub data_file: Option<String>,

    /// HTTP method (get, post, put, patch, delete)
    #[arg(short = 'm', long, env = "REQD_METHOD")]
    pub method: Option<String>,

    /// Authorization scheme, e.g. Bearer
    #[arg(short = 's', long, env = "REQD_TOKEN_SCHEME")]
    pub token_scheme: Option<String>,

    /// Authorization token
    #[arg(short = 't', long, env = "REQD_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Write failed request/response pairs to this file
    #[arg(long, env = "REQD_FAILURE_LOG")]
    pub failure_log: Option<String>,

    /// Write successful request/response pairs to this file
    #[arg(long, env = "REQD_SUCCESS_LOG")]
    pub success_log: Option<String>,

    /// Extra header sent with every request ("Name: value", repeatable)
    #[arg(
        short = 'H',
        long = "header",
        value_name = "HEADER",
        env = "REQD_HEADERS",
        value_delimiter = ';'
    )]
    pub headers: Vec<String>,

    /// Path to configuration file (key = value, TOML or JSON)
    #[arg(short, long, env = "REQD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Never prompt; missing values are an error
    #[arg(long, env = "REQD_NO_PROMPT")]
    pub no_prompt: bool,

    /// Resolve configuration and load the input file without sending anything
    #[arg(long, env = "REQD_DRY_RUN")]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "REQD_METRICS_PORT")]
    pub metrics_port: u16,

    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, env = "REQD_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, conflicts_with = "verbose", env = "REQD_QUIET")]
    pub quiet: bool,

    /// Log output format
    #[arg(long, value_enum, default_value = "pretty", env = "REQD_LOG_FORMAT")]
    pub log_format: LogFormat,
}

impl Cli {
    /// Configuration layer given on the command line
    pub fn config_layer(&self) -> RawConfig {
        RawConfig {
            worker_count: self.workers,
            url: self.url.clone(),
            data_file: self.data_file.clone(),
            method: self.method.clone(),
            token_scheme: self.token_scheme.clone(),
            token_value: self.token.clone(),
            failure_log: self.failure_log.clone(),
            success_log: self.success_log.clone(),
            headers: self.headers.clone(),
        }
    }
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
