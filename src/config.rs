use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{credentials::CredentialRef, types::SdkLibrary};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    pub credential: CredentialRef,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub libraries: Vec<SdkLibrary>,
    #[serde(default = "default_download_timeout_ms")]
    pub download_timeout_ms: u64,
    #[serde(default = "default_activation_timeout_ms")]
    pub activation_timeout_ms: u64,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_endpoint() -> String {
    "https://sdk.vendor.example/bundle".to_string()
}

fn default_download_timeout_ms() -> u64 {
    20_000
}

fn default_activation_timeout_ms() -> u64 {
    3_000
}

fn default_retry_max_attempts() -> u32 {
    3
}

fn default_retry_backoff_base_ms() -> u64 {
    1_500
}

fn default_retry_backoff_max_ms() -> u64 {
    12_000
}

fn default_logging_filter() -> String {
    "info".to_string()
}

fn default_enabled_true() -> bool {
    true
}

/// Caller-boundary retry schedule. The coordinator itself never retries;
/// this drives `retry::acquire_with_retry`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_retry_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_backoff_base_ms")]
    pub backoff_base_ms: u64,
    #[serde(default = "default_retry_backoff_max_ms")]
    pub backoff_max_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_retry_max_attempts(),
            backoff_base_ms: default_retry_backoff_base_ms(),
            backoff_max_ms: default_retry_backoff_max_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// When set, loader events are also written as JSON to a daily-rolled
    /// file under this directory.
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default = "default_logging_filter")]
    pub filter: String,
    #[serde(default = "default_enabled_true")]
    pub stderr_warn_enabled: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: None,
            filter: default_logging_filter(),
            stderr_warn_enabled: true,
        }
    }
}

impl LoaderConfig {
    pub fn load(config_path: &Path) -> Result<Self> {
        let content = fs::read_to_string(config_path)
            .with_context(|| format!("failed to read config {}", config_path.display()))?;
        let value: Value = json5::from_str(&content)
            .with_context(|| format!("failed to parse config {}", config_path.display()))?;
        let config: LoaderConfig =
            serde_json::from_value(value).context("failed to deserialize loader config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if let CredentialRef::Inline { key } = &self.credential {
            if key.trim().is_empty() {
                return Err(anyhow!("credential.key cannot be empty"));
            }
        }
        if self.endpoint.trim().is_empty() {
            return Err(anyhow!("endpoint cannot be empty"));
        }
        if self.download_timeout_ms == 0 {
            return Err(anyhow!("download_timeout_ms must be greater than zero"));
        }
        if self.activation_timeout_ms == 0 {
            return Err(anyhow!("activation_timeout_ms must be greater than zero"));
        }
        if self.retry.max_attempts == 0 {
            return Err(anyhow!("retry.max_attempts must be at least 1"));
        }
        Ok(())
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_millis(self.download_timeout_ms)
    }

    pub fn activation_timeout(&self) -> Duration {
        Duration::from_millis(self.activation_timeout_ms)
    }
}
