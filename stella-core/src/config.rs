//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/stella/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/stella/` (~/.config/stella/)
//! - Data: `$XDG_DATA_HOME/stella/` (~/.local/share/stella/)
//! - State/Logs: `$XDG_STATE_HOME/stella/` (~/.local/state/stella/)

use crate::error::{Error, Result};
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct Config {
    /// Training session timing and rewards
    #[serde(default)]
    pub session: SessionConfig,

    /// STELLA guidance mode and backend
    #[serde(default)]
    pub guidance: GuidanceConfig,

    /// Assessment submission endpoint
    #[serde(default)]
    pub submission: SubmissionConfig,

    /// Assessment bank override
    #[serde(default)]
    pub assessments: AssessmentsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Training session configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SessionConfig {
    /// Elapsed-time clock granularity in milliseconds
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,

    /// Interval between mock metric updates in milliseconds
    #[serde(default = "default_metrics_interval_ms")]
    pub metrics_interval_ms: u64,

    /// Credits awarded per completed exercise
    #[serde(default = "default_credits_per_exercise")]
    pub credits_per_exercise: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            metrics_interval_ms: default_metrics_interval_ms(),
            credits_per_exercise: default_credits_per_exercise(),
        }
    }
}

impl SessionConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn metrics_interval(&self) -> Duration {
        Duration::from_millis(self.metrics_interval_ms)
    }
}

fn default_tick_ms() -> u64 {
    1000
}

fn default_metrics_interval_ms() -> u64 {
    3000
}

fn default_credits_per_exercise() -> u64 {
    10
}

/// Where guidance comes from
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GuidanceMode {
    /// Answer everything with the local engine
    #[default]
    Mock,
    /// Ask the guidance backend, falling back to the local engine
    Remote,
}

/// Guidance configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GuidanceConfig {
    #[serde(default)]
    pub mode: GuidanceMode,

    /// Guidance backend URL (required in remote mode)
    pub server_url: Option<String>,

    /// Bearer token for the backend
    pub api_key: Option<String>,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Max retry attempts for transient failures
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Number of guidance/question entries kept in history
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

impl Default for GuidanceConfig {
    fn default() -> Self {
        Self {
            mode: GuidanceMode::default(),
            server_url: None,
            api_key: None,
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            history_limit: default_history_limit(),
        }
    }
}

impl GuidanceConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries)
    }
}

fn default_history_limit() -> usize {
    50
}

/// Assessment submission configuration
///
/// Without a `server_url` submissions are recorded in the local store.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SubmissionConfig {
    pub server_url: Option<String>,

    pub api_key: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            server_url: None,
            api_key: None,
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

impl SubmissionConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries)
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> usize {
    3
}

/// Assessment bank configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AssessmentsConfig {
    /// JSON file replacing the built-in assessment definitions
    pub path: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.session.tick_ms == 0 || self.session.metrics_interval_ms == 0 {
            return Err(Error::Config(
                "session.tick_ms and session.metrics_interval_ms must be positive".to_string(),
            ));
        }
        if self.guidance.mode == GuidanceMode::Remote && self.guidance.server_url.is_none() {
            return Err(Error::Config(
                "guidance.server_url is required when guidance.mode = \"remote\"".to_string(),
            ));
        }
        if self.guidance.history_limit == 0 {
            return Err(Error::Config(
                "guidance.history_limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/stella/config.toml` (~/.config/stella/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("stella").join("config.toml")
    }

    /// Returns the data directory path (for the SQLite store)
    ///
    /// `$XDG_DATA_HOME/stella/` (~/.local/share/stella/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("stella")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/stella/` (~/.local/state/stella/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("stella")
    }

    /// Returns the store file path
    ///
    /// `$XDG_DATA_HOME/stella/stella.db` (~/.local/share/stella/stella.db)
    pub fn database_path() -> PathBuf {
        Self::data_dir().join("stella.db")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/stella/stella.log` (~/.local/state/stella/stella.log)
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("stella.log")
    }
}
