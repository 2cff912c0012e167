//! Configuration loading from TOML files

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::ValueEnum;
use ingestline_bulk::config::{
    DEFAULT_BATCH_SIZE, DEFAULT_CUSTOMER_URL, DEFAULT_FILE_PATH, DEFAULT_RATE_LIMIT_PER_MINUTE,
    DEFAULT_TRANSACTION_URL,
};
use ingestline_bulk::{Endpoints, IngestConfig, RecordKind, RetryPolicy};
use serde::Deserialize;

/// Global configuration for ingestline
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub input: InputConfig,
    pub ingest: IngestSection,
    pub endpoints: EndpointsConfig,
    pub retry: RetryConfig,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub file_path: PathBuf,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            file_path: PathBuf::from(DEFAULT_FILE_PATH),
        }
    }
}

/// Record kind as named on the command line and in config files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    #[default]
    Customer,
    Transaction,
}

impl From<Kind> for RecordKind {
    fn from(k: Kind) -> Self {
        match k {
            Kind::Customer => RecordKind::Customer,
            Kind::Transaction => RecordKind::Transaction,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct IngestSection {
    pub batch_size: usize,
    pub rate_limit_per_minute: u32,
    pub record_kind: Kind,
}

impl Default for IngestSection {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            rate_limit_per_minute: DEFAULT_RATE_LIMIT_PER_MINUTE,
            record_kind: Kind::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EndpointsConfig {
    #[serde(deserialize_with = "deserialize_env_var")]
    pub customer_url: String,
    #[serde(deserialize_with = "deserialize_env_var")]
    pub transaction_url: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            customer_url: DEFAULT_CUSTOMER_URL.to_string(),
            transaction_url: DEFAULT_TRANSACTION_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    /// Ignore `max_retries` and retry transient failures forever
    pub unbounded: bool,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub rate_limit_min_ms: u64,
    pub rate_limit_max_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_retries: policy.max_retries.unwrap_or(5),
            unbounded: false,
            base_delay_ms: policy.base_delay.as_millis() as u64,
            max_delay_ms: policy.max_delay.as_millis() as u64,
            rate_limit_min_ms: policy.rate_limit_min.as_millis() as u64,
            rate_limit_max_ms: policy.rate_limit_max.as_millis() as u64,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: (!self.unbounded).then_some(self.max_retries),
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            rate_limit_min: Duration::from_millis(self.rate_limit_min_ms),
            rate_limit_max: Duration::from_millis(self.rate_limit_max_ms),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: ingestline_core::DEFAULT_REQUEST_TIMEOUT.as_secs(),
        }
    }
}

/// Deserialize a string that may be an environment variable reference like ${VAR}
fn deserialize_env_var<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    expand_env_var(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("environment variable in {raw} is not set")))
}

/// Expand ${VAR} to environment variable value
fn expand_env_var(s: &str) -> Option<String> {
    if let Some(var_name) = s.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
        std::env::var(var_name).ok()
    } else {
        Some(s.to_string())
    }
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./ingestline.toml (current directory)
    /// 2. ~/.config/ingestline/config.toml
    ///
    /// If no config file found, returns default config.
    pub fn load() -> Result<Self> {
        let local_config = PathBuf::from("ingestline.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "ingestline") {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Run configuration before command-line overrides.
    pub fn ingest_config(&self) -> IngestConfig {
        IngestConfig {
            file_path: self.input.file_path.clone(),
            batch_size: self.ingest.batch_size,
            kind: self.ingest.record_kind.into(),
            endpoints: Endpoints {
                customer: self.endpoints.customer_url.clone(),
                transaction: self.endpoints.transaction_url.clone(),
            },
            rate_limit_per_minute: self.ingest.rate_limit_per_minute,
            retry: self.retry.policy(),
        }
    }
}
