//! # Config Loader
//!
//! Configuration loading and resolution module.
//!
//! Responsibilities:
//! - Parse `key = value` / TOML / JSON configuration files
//! - Merge command-line and file layers (command line wins)
//! - Prompt for missing required values
//! - Validate and produce `DispatchConfig`
//! - Load the job data file
//!
//! # Example
//!
//! ```no_run
//! use config_loader::{resolve, ConfigLoader, RawConfig};
//!
//! let file = ConfigLoader::load(None).unwrap();
//! let resolved = resolve(RawConfig::default().merge(file)).unwrap();
//! println!("URL: {}", resolved.dispatch.url);
//! ```

mod jobs;
mod parser;
mod paths;
mod prompt;
mod resolve;

pub use contracts::DispatchConfig;
pub use jobs::{load_jobs, parse_jobs};
pub use parser::ConfigFormat;
pub use paths::expand_path;
pub use prompt::{prompt_additional_header, prompt_missing};
pub use resolve::{resolve, RequiredField, ResolvedConfig};

use contracts::ContractError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "~/.reqd.conf";

/// One configuration layer before merging
///
/// Every field is optional; layers are combined with [`RawConfig::merge`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawConfig {
    pub worker_count: Option<usize>,
    pub url: Option<String>,
    pub data_file: Option<String>,
    pub method: Option<String>,
    pub token_scheme: Option<String>,
    pub token_value: Option<String>,
    pub failure_log: Option<String>,
    pub success_log: Option<String>,
    /// `Name: value` entries
    pub headers: Vec<String>,
}

/// Configuration loader
///
/// Provides static methods to load configuration layers from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load the file layer
    ///
    /// An explicit path must exist. Without one, `~/.reqd.conf` is read if
    /// present and an empty layer is returned otherwise.
    pub fn load(explicit: Option<&Path>) -> Result<RawConfig, ContractError> {
        match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(ContractError::ConfigNotFound {
                        path: path.display().to_string(),
                    });
                }
                Self::load_from_path(path)
            }
            None => {
                let path = Self::default_path();
                if path.exists() {
                    Self::load_from_path(&path)
                } else {
                    debug!(path = %path.display(), "No default config file, using empty layer");
                    Ok(RawConfig::default())
                }
            }
        }
    }

    /// Load configuration from file path
    ///
    /// Format is detected from the file extension (.toml / .json, otherwise `key = value`).
    pub fn load_from_path(path: &Path) -> Result<RawConfig, ContractError> {
        let format = ConfigFormat::from_extension(path.extension().and_then(|e| e.to_str()));
        let content = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), format = ?format, "Loading config file");
        Self::load_from_str(&content, format)
    }

    /// Load configuration from string
    pub fn load_from_str(content: &str, format: ConfigFormat) -> Result<RawConfig, ContractError> {
        parser::parse(content, format)
    }

    /// Expanded default configuration path
    pub fn default_path() -> PathBuf {
        expand_path(DEFAULT_CONFIG_PATH)
    }
}

/// Mask a token for display, keeping only the last four characters
pub fn redact_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    match chars.len() {
        0 => String::new(),
        n if n <= 4 => "****".to_string(),
        n => format!("****{}", chars[n - 4..].iter().collect::<String>()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_redact_token() {
        assert_eq!(redact_token(""), "");
        assert_eq!(redact_token("abcd"), "****");
        assert_eq!(redact_token("supersecrettoken"), "****oken");
    }

    #[test]
    fn test_load_explicit_missing_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = ConfigLoader::load(Some(&dir.path().join("nope.conf")));
        assert!(matches!(result, Err(ContractError::ConfigNotFound { .. })));
    }

    #[test]
    fn test_load_from_path_detects_format() {
        let dir = tempfile::tempdir().unwrap();

        let conf = dir.path().join("reqd.conf");
        let mut f = std::fs::File::create(&conf).unwrap();
        writeln!(f, "worker_count = 3\nurl = http://localhost/a").unwrap();

        let toml_path = dir.path().join("reqd.toml");
        let mut f = std::fs::File::create(&toml_path).unwrap();
        writeln!(f, "worker_count = 7\nurl = \"http://localhost/b\"").unwrap();

        let kv = ConfigLoader::load(Some(&conf)).unwrap();
        assert_eq!(kv.worker_count, Some(3));
        assert_eq!(kv.url.as_deref(), Some("http://localhost/a"));

        let toml = ConfigLoader::load(Some(&toml_path)).unwrap();
        assert_eq!(toml.worker_count, Some(7));
    }

    #[test]
    fn test_toml_unknown_key_rejected() {
        let result = ConfigLoader::load_from_str("colour = \"blue\"", ConfigFormat::Toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_layer_over_file_layer() {
        let file = ConfigLoader::load_from_str(
            "worker_count = 2\nurl = http://file/x\ndata_file = d.json\nmethod = get",
            ConfigFormat::KeyValue,
        )
        .unwrap();
        let cli = RawConfig {
            worker_count: Some(9),
            ..Default::default()
        };

        let resolved = resolve(cli.merge(file)).unwrap();
        assert_eq!(resolved.dispatch.worker_count, 9);
        assert_eq!(resolved.dispatch.url, "http://file/x");
    }
}
