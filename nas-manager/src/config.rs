//! Configuration management for the NAS manager.
//!
//! Loads configuration from a TOML file with environment variable overrides.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::services::retention::RetentionPolicy;
use crate::services::retry::RetryPolicy;
use crate::utils::errors::{NasError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub truenas: TrueNasConfig,
    #[serde(default)]
    pub log: LogConfig,
    /// Default policy for `snapshot retention`; CLI flags override it
    #[serde(default)]
    pub retention: RetentionPolicy,
    #[serde(default)]
    pub replication: ReplicationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrueNasConfig {
    /// Hostname, or a full `http(s)://` base URL
    #[serde(default)]
    pub host: String,

    /// API key sent as a bearer token
    #[serde(default)]
    pub api_key: String,

    /// Verify the TLS certificate (TrueNAS ships self-signed by default)
    #[serde(default)]
    pub verify_ssl: bool,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplicationConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,

    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// How long a single retry attempt may run before it counts as failed
    #[serde(default = "default_wait_timeout_secs")]
    pub wait_timeout_secs: u64,

    /// Failed tasks retried at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

// Default values
fn default_timeout_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_secs() -> u64 {
    60
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_wait_timeout_secs() -> u64 {
    600
}

fn default_concurrency() -> usize {
    1
}

impl Default for TrueNasConfig {
    fn default() -> Self {
        TrueNasConfig {
            host: String::new(),
            api_key: String::new(),
            verify_ssl: false,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: default_log_level(),
        }
    }
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        ReplicationConfig {
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay_secs(),
            poll_interval_secs: default_poll_interval_secs(),
            wait_timeout_secs: default_wait_timeout_secs(),
            concurrency: default_concurrency(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            truenas: TrueNasConfig::default(),
            log: LogConfig::default(),
            retention: RetentionPolicy::default(),
            replication: ReplicationConfig::default(),
        }
    }
}

impl ReplicationConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            retry_delay: Duration::from_secs(self.retry_delay_secs),
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            wait_timeout: Duration::from_secs(self.wait_timeout_secs),
            concurrency: self.concurrency,
        }
    }
}

impl TrueNasConfig {
    /// `https://{host}/api/v2.0`, or the host as given if it carries a scheme.
    pub fn base_url(&self) -> String {
        let host = self.host.trim_end_matches('/');
        let root = if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("https://{}", host)
        };
        format!("{}/api/v2.0", root)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(NasError::Config(
                "missing TrueNAS host (set truenas.host or TRUENAS_HOST)".to_string(),
            ));
        }
        if self.api_key.trim().is_empty() {
            return Err(NasError::Config(
                "missing API key (set truenas.api_key or TRUENAS_API_KEY)".to_string(),
            ));
        }
        Ok(())
    }
}

impl Config {
    /// Default config location, `$HOME/.truenas/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".truenas").join("config.toml"))
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            NasError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Load from an explicit path, else the default path if it exists, else
    /// defaults. Environment overrides are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(default) if default.exists() => Self::from_file(&default)?,
                _ => Config::default(),
            },
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply `TRUENAS_HOST`, `TRUENAS_API_KEY` and `TRUENAS_VERIFY_SSL`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("TRUENAS_HOST").filter(|v| !v.is_empty()) {
            self.truenas.host = host;
        }
        if let Some(key) = lookup("TRUENAS_API_KEY").filter(|v| !v.is_empty()) {
            self.truenas.api_key = key;
        }
        if let Some(verify) = lookup("TRUENAS_VERIFY_SSL") {
            self.truenas.verify_ssl = matches!(verify.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
    }
}
