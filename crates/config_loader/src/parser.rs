//! 配置解析模块
//!
//! 支持行式 `key = value` (默认)、TOML 与 JSON 格式。

use contracts::ContractError;
use tracing::warn;

use crate::RawConfig;

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// `key = value` 行格式 (默认)
    KeyValue,
    /// TOML 格式
    Toml,
    /// JSON 格式
    Json,
}

impl ConfigFormat {
    /// 从文件扩展名推断格式，未知扩展名视为 `key = value`
    pub fn from_extension(ext: Option<&str>) -> Self {
        match ext.map(str::to_lowercase).as_deref() {
            Some("toml") => Self::Toml,
            Some("json") => Self::Json,
            _ => Self::KeyValue,
        }
    }
}

/// 解析 `key = value` 行格式
///
/// 空行与 `#` 开头的注释被忽略；每行按第一个 `=` 分割，两侧去除空白。
/// 没有 `=` 的行被忽略。`header` 可重复出现。
pub fn parse_key_value(content: &str) -> Result<RawConfig, ContractError> {
    let mut config = RawConfig::default();

    for (line_no, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim().to_string();

        match key {
            "worker_count" => {
                let count = value.parse::<usize>().map_err(|e| ContractError::ConfigParse {
                    message: format!("line {}: invalid worker_count '{value}'", line_no + 1),
                    source: Some(Box::new(e)),
                })?;
                config.worker_count = Some(count);
            }
            "url" => config.url = Some(value),
            "data_file" => config.data_file = Some(value),
            "method" => config.method = Some(value),
            "token_scheme" => config.token_scheme = Some(value),
            "token_value" => config.token_value = Some(value),
            "failure_log" => config.failure_log = Some(value),
            "success_log" => config.success_log = Some(value),
            "header" => config.headers.push(value),
            other => warn!(key = other, line = line_no + 1, "Ignoring unknown config key"),
        }
    }

    Ok(config)
}

/// 解析 TOML 格式配置
pub fn parse_toml(content: &str) -> Result<RawConfig, ContractError> {
    toml::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 解析 JSON 格式配置
pub fn parse_json(content: &str) -> Result<RawConfig, ContractError> {
    serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 根据格式解析配置
pub fn parse(content: &str, format: ConfigFormat) -> Result<RawConfig, ContractError> {
    match format {
        ConfigFormat::KeyValue => parse_key_value(content),
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}
