//! DispatchConfig - resolved run parameters
//!
//! Produced by `config_loader`, consumed read-only by the dispatcher.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use validator::Validate;

use crate::ContractError;

/// Status code that classifies an exchange as a success
pub const SUCCESS_STATUS: u16 = 200;

/// Default capacity of the per-sink forwarding queue
pub const DEFAULT_SINK_BUFFER: usize = 500;

/// HTTP method used for every request of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HttpMethod {
    Get,
    #[default]
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    /// Upper-case wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            other => Err(ContractError::config_validation(
                "method",
                format!("unsupported method '{other}', expected one of GET, POST, PUT, PATCH, DELETE"),
            )),
        }
    }
}

/// Authorization header parameters
///
/// Rendered as `"<scheme> <token>"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenAuth {
    pub scheme: String,
    pub token: String,
}

impl TokenAuth {
    pub fn new(scheme: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            token: token.into(),
        }
    }

    /// Value for the `Authorization` header
    pub fn header_value(&self) -> String {
        format!("{} {}", self.scheme, self.token)
    }
}

/// Extra request header
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct Header {
    #[validate(length(min = 1, message = "header name cannot be empty"))]
    pub name: String,
    pub value: String,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl FromStr for Header {
    type Err = ContractError;

    /// Parse a colon separated `Name: value` pair
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, value) = s.split_once(':').ok_or_else(|| {
            ContractError::config_validation("header", format!("expected 'Name: value', got '{s}'"))
        })?;
        Ok(Self::new(name.trim(), value.trim()))
    }
}

/// Resolved dispatch parameters
///
/// Immutable for the lifetime of a dispatch run.
#[derive(Debug, Clone, Validate)]
pub struct DispatchConfig {
    /// Number of concurrent workers
    #[validate(range(min = 1, message = "worker count must be at least 1"))]
    pub worker_count: usize,

    /// Target URL
    #[validate(url(message = "url is not a valid URL"))]
    pub url: String,

    /// HTTP method
    pub method: HttpMethod,

    /// Authorization header, set only when a scheme is configured
    pub auth: Option<TokenAuth>,

    /// Additional headers applied to every request
    #[validate(nested)]
    pub headers: Vec<Header>,

    /// Destination for failed exchanges
    pub failure_log: Option<PathBuf>,

    /// Destination for successful exchanges
    pub success_log: Option<PathBuf>,

    /// Capacity of each sink forwarding queue
    #[validate(range(min = 1, message = "sink buffer must be at least 1"))]
    pub sink_buffer: usize,
}

impl DispatchConfig {
    /// Minimal configuration: POST to `url` with `worker_count` workers, no sinks
    pub fn new(url: impl Into<String>, worker_count: usize) -> Self {
        Self {
            worker_count,
            url: url.into(),
            method: HttpMethod::default(),
            auth: None,
            headers: Vec::new(),
            failure_log: None,
            success_log: None,
            sink_buffer: DEFAULT_SINK_BUFFER,
        }
    }
}
