// TOML config adapter - Configuration management using TOML files

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;
use crate::error::{TrimmerError, TrimmerResult};
use crate::utils::logging::LogFormat;

/// Upstream trim-info endpoint
pub const DEFAULT_TRIM_URL: &str = "http://91.108.111.214/api/trim";
/// Upstream download endpoint
pub const DEFAULT_DOWNLOAD_URL: &str = "https://api.downloadbazar.com/download/";
/// Upstream merge submit/status endpoint
pub const DEFAULT_MERGE_URL: &str = "http://91.108.111.214/api/merge";
/// Upstream output existence-check endpoint
pub const DEFAULT_FILE_CHECK_URL: &str = "http://91.108.111.214/api/file-check";

/// Application configuration, read from the `[trimmer]` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub bind_addr: String,
    pub trim_url: String,
    pub download_url: String,
    pub merge_url: String,
    pub file_check_url: String,
    pub poll_interval_ms: u64,
    pub max_poll_failures: u32,
    pub request_timeout_secs: u64,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            trim_url: DEFAULT_TRIM_URL.to_string(),
            download_url: DEFAULT_DOWNLOAD_URL.to_string(),
            merge_url: DEFAULT_MERGE_URL.to_string(),
            file_check_url: DEFAULT_FILE_CHECK_URL.to_string(),
            poll_interval_ms: 2000,
            max_poll_failures: 3,
            request_timeout_secs: 30,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl AppConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Apply a single `key = value` override
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), DomainError> {
        match key {
            "bind_addr" => self.bind_addr = value.to_string(),
            "trim_url" => self.trim_url = value.to_string(),
            "download_url" => self.download_url = value.to_string(),
            "merge_url" => self.merge_url = value.to_string(),
            "file_check_url" => self.file_check_url = value.to_string(),
            "poll_interval_ms" => self.poll_interval_ms = parse_number(key, value)?,
            "max_poll_failures" => self.max_poll_failures = parse_number(key, value)?,
            "request_timeout_secs" => self.request_timeout_secs = parse_number(key, value)?,
            "log_level" => self.log_level = value.to_string(),
            "log_format" => self.log_format = value.parse()?,
            _ => return Err(DomainError::Config(format!("Unknown config key: {}", key))),
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.bind_addr.parse::<std::net::SocketAddr>().is_err() {
            return Err(DomainError::Config(format!(
                "bind_addr is not a socket address: {}",
                self.bind_addr
            )));
        }

        for (key, url) in [
            ("trim_url", &self.trim_url),
            ("download_url", &self.download_url),
            ("merge_url", &self.merge_url),
            ("file_check_url", &self.file_check_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(DomainError::Config(format!(
                    "{} must be an http(s) URL: {}",
                    key, url
                )));
            }
        }

        if self.poll_interval_ms == 0 {
            return Err(DomainError::Config(
                "poll_interval_ms must be positive".to_string(),
            ));
        }
        if self.max_poll_failures == 0 {
            return Err(DomainError::Config(
                "max_poll_failures must be at least 1".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(DomainError::Config(
                "request_timeout_secs must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, DomainError>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| DomainError::Config(format!("Invalid value for {}: {}", key, e)))
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    trimmer: AppConfig,
}

/// TOML configuration adapter
pub struct TomlConfigAdapter;

impl TomlConfigAdapter {
    /// Files probed, in order, when no path is given
    pub const SEARCH_PATHS: [&'static str; 2] = ["trimmer.toml", "config/trimmer.toml"];

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> TrimmerResult<AppConfig> {
        let parsed: ConfigFile = toml::from_str(content)?;
        Ok(parsed.trimmer)
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> TrimmerResult<AppConfig> {
        if !path.exists() {
            return Err(TrimmerError::ConfigError {
                message: format!("Config file does not exist: {}", path.display()),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// First existing file among [`Self::SEARCH_PATHS`] under `base`
    pub fn find_default(base: &Path) -> Option<PathBuf> {
        Self::SEARCH_PATHS
            .iter()
            .map(|p| base.join(p))
            .find(|p| p.is_file())
    }
}
