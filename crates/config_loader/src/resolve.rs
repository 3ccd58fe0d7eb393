//! 配置合并与校验模块
//!
//! 规则：
//! - 命令行 > 配置文件 > 交互式输入
//! - worker_count / url / data_file / method 必填
//! - worker_count >= 1, url 合法, method 受支持
//! - token_scheme 存在时才设置 Authorization

use std::path::PathBuf;

use contracts::{ContractError, DispatchConfig, Header, HttpMethod, TokenAuth, DEFAULT_SINK_BUFFER};
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::Url;
use validator::{Validate, ValidationErrors};

use crate::paths::expand_path;
use crate::RawConfig;

/// Required value that may be collected interactively
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredField {
    WorkerCount,
    Url,
    DataFile,
    Method,
}

impl RequiredField {
    /// All required fields, in prompt order
    pub const ALL: [RequiredField; 4] = [
        RequiredField::WorkerCount,
        RequiredField::Url,
        RequiredField::DataFile,
        RequiredField::Method,
    ];

    /// Config key name
    pub fn key(&self) -> &'static str {
        match self {
            Self::WorkerCount => "worker_count",
            Self::Url => "url",
            Self::DataFile => "data_file",
            Self::Method => "method",
        }
    }

    /// Interactive prompt label
    pub fn prompt(&self) -> &'static str {
        match self {
            Self::WorkerCount => "Worker count: ",
            Self::Url => "Url: ",
            Self::DataFile => "JSON file path: ",
            Self::Method => "Method (post, get, put, delete): ",
        }
    }
}

impl RawConfig {
    /// Merge two layers, `self` taking precedence
    ///
    /// Empty strings and a zero worker count count as absent.
    pub fn merge(self, fallback: RawConfig) -> RawConfig {
        let primary = self.normalized();
        let fallback = fallback.normalized();

        RawConfig {
            worker_count: primary.worker_count.or(fallback.worker_count),
            url: primary.url.or(fallback.url),
            data_file: primary.data_file.or(fallback.data_file),
            method: primary.method.or(fallback.method),
            token_scheme: primary.token_scheme.or(fallback.token_scheme),
            token_value: primary.token_value.or(fallback.token_value),
            failure_log: primary.failure_log.or(fallback.failure_log),
            success_log: primary.success_log.or(fallback.success_log),
            headers: if primary.headers.is_empty() {
                fallback.headers
            } else {
                primary.headers
            },
        }
    }

    /// Required fields still missing, in prompt order
    pub fn missing_required(&self) -> Vec<RequiredField> {
        let config = self.clone().normalized();
        RequiredField::ALL
            .into_iter()
            .filter(|field| match field {
                RequiredField::WorkerCount => config.worker_count.is_none(),
                RequiredField::Url => config.url.is_none(),
                RequiredField::DataFile => config.data_file.is_none(),
                RequiredField::Method => config.method.is_none(),
            })
            .collect()
    }

    /// Set a required field from user input
    pub fn set_required(&mut self, field: RequiredField, value: &str) -> Result<(), ContractError> {
        let value = value.trim().to_string();
        match field {
            RequiredField::WorkerCount => {
                let count = value.parse::<usize>().map_err(|e| ContractError::ConfigParse {
                    message: format!("invalid worker count '{value}'"),
                    source: Some(Box::new(e)),
                })?;
                self.worker_count = Some(count);
            }
            RequiredField::Url => self.url = Some(value),
            RequiredField::DataFile => self.data_file = Some(value),
            RequiredField::Method => self.method = Some(value),
        }
        Ok(())
    }

    fn normalized(self) -> RawConfig {
        fn non_empty(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.trim().is_empty())
        }

        RawConfig {
            worker_count: self.worker_count.filter(|&n| n != 0),
            url: non_empty(self.url),
            data_file: non_empty(self.data_file),
            method: non_empty(self.method),
            token_scheme: non_empty(self.token_scheme),
            token_value: non_empty(self.token_value),
            failure_log: non_empty(self.failure_log),
            success_log: non_empty(self.success_log),
            headers: self.headers,
        }
    }
}

/// Fully resolved run configuration
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Parameters handed to the dispatcher
    pub dispatch: DispatchConfig,
    /// JSON file holding the request bodies
    pub data_file: PathBuf,
}

/// Turn a merged raw configuration into a validated one
///
/// Fails on the first missing required field, then on validation failures.
pub fn resolve(raw: RawConfig) -> Result<ResolvedConfig, ContractError> {
    let raw = raw.normalized();
    let missing = |field: RequiredField| {
        ContractError::config_validation(field.key(), "missing required value")
    };

    let worker_count = raw.worker_count.ok_or_else(|| missing(RequiredField::WorkerCount))?;
    let url = raw.url.ok_or_else(|| missing(RequiredField::Url))?;
    let data_file = raw.data_file.ok_or_else(|| missing(RequiredField::DataFile))?;
    let method: HttpMethod = raw
        .method
        .ok_or_else(|| missing(RequiredField::Method))?
        .parse()?;

    let auth = raw
        .token_scheme
        .map(|scheme| TokenAuth::new(scheme, raw.token_value.unwrap_or_default()));

    let headers = raw
        .headers
        .iter()
        .map(|h| h.parse::<Header>())
        .collect::<Result<Vec<_>, _>>()?;

    let dispatch = DispatchConfig {
        worker_count,
        url,
        method,
        auth,
        headers,
        failure_log: raw.failure_log.as_deref().map(expand_path),
        success_log: raw.success_log.as_deref().map(expand_path),
        sink_buffer: DEFAULT_SINK_BUFFER,
    };
    dispatch.validate().map_err(validation_error)?;
    check_sendable(&dispatch)?;

    Ok(ResolvedConfig {
        dispatch,
        data_file: expand_path(&data_file),
    })
}

/// Reject values the HTTP client would refuse when building a request
fn check_sendable(dispatch: &DispatchConfig) -> Result<(), ContractError> {
    let url = Url::parse(&dispatch.url)
        .map_err(|e| ContractError::config_validation("url", e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ContractError::config_validation(
            "url",
            format!("unsupported scheme '{}', expected http or https", url.scheme()),
        ));
    }

    for header in &dispatch.headers {
        HeaderName::from_bytes(header.name.as_bytes()).map_err(|_| {
            ContractError::config_validation("headers", format!("invalid header name '{}'", header.name))
        })?;
        HeaderValue::from_str(&header.value).map_err(|_| {
            ContractError::config_validation(
                "headers",
                format!("invalid value for header '{}'", header.name),
            )
        })?;
    }

    if let Some(auth) = &dispatch.auth {
        HeaderValue::from_str(&auth.header_value()).map_err(|_| {
            ContractError::config_validation("token", "token is not a valid header value")
        })?;
    }
    Ok(())
}

fn validation_error(errors: ValidationErrors) -> ContractError {
    let mut fields: Vec<String> = errors.errors().keys().map(|k| k.to_string()).collect();
    fields.sort();
    ContractError::config_validation(fields.join(", "), errors.to_string())
}
