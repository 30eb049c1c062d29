//! Configuration settings for todosync.
//!
//! Settings are loaded from `~/.todosync/config.yaml`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cli::args::OutputFormat;
use crate::config::Paths;
use crate::conflict::ConflictStrategy;
use crate::error::TodoSyncError;
use crate::sync::{BackoffPolicy, EngineConfig};

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// General settings.
    pub general: GeneralConfig,
    /// Sync engine settings.
    pub sync: SyncConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Default output format.
    #[serde(default = "default_output_format")]
    pub default_output: OutputFormat,
    /// Color output setting.
    #[serde(default = "default_color")]
    pub color: ColorSetting,
}

/// Color output setting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ColorSetting {
    /// Auto-detect based on terminal.
    #[default]
    Auto,
    /// Always use colors.
    Always,
    /// Never use colors.
    Never,
}

/// Sync engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Failed attempts before an operation is parked for manual retry.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base backoff delay in milliseconds.
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    /// Growth factor applied per retry.
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: u32,
    /// Upper bound of the uniform jitter added to each delay.
    #[serde(default = "default_max_jitter_ms")]
    pub max_jitter_ms: u64,
    /// Cap on the exponential part of the delay.
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    /// Wait before the very first attempt as well.
    #[serde(default)]
    pub delay_first_attempt: bool,
    /// Abandon the rest of a drain pass when connectivity drops.
    #[serde(default = "default_true")]
    pub abort_when_offline: bool,
    /// Days a sync log entry is kept.
    #[serde(default = "default_log_retention_days")]
    pub log_retention_days: u32,
    /// Strategy used when the CLI is not given one.
    #[serde(default)]
    pub default_strategy: ConflictStrategy,
    /// Simulated round trip of the stub transport.
    #[serde(default = "default_transport_latency_ms")]
    pub transport_latency_ms: u64,
}

// Default value functions for serde
const fn default_output_format() -> OutputFormat {
    OutputFormat::Pretty
}

const fn default_color() -> ColorSetting {
    ColorSetting::Auto
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_initial_backoff_ms() -> u64 {
    1000
}

const fn default_backoff_multiplier() -> u32 {
    2
}

const fn default_max_jitter_ms() -> u64 {
    1000
}

const fn default_max_backoff_ms() -> u64 {
    300_000
}

const fn default_true() -> bool {
    true
}

const fn default_log_retention_days() -> u32 {
    30
}

const fn default_transport_latency_ms() -> u64 {
    500
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_output: default_output_format(),
            color: default_color(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            max_jitter_ms: default_max_jitter_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            delay_first_attempt: false,
            abort_when_offline: default_true(),
            log_retention_days: default_log_retention_days(),
            default_strategy: ConflictStrategy::default(),
            transport_latency_ms: default_transport_latency_ms(),
        }
    }
}

impl SyncConfig {
    /// Backoff policy described by these settings.
    #[must_use]
    pub const fn backoff(&self) -> BackoffPolicy {
        BackoffPolicy {
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            multiplier: self.backoff_multiplier,
            max_jitter: Duration::from_millis(self.max_jitter_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
            delay_first_attempt: self.delay_first_attempt,
        }
    }

    /// Engine configuration described by these settings.
    #[must_use]
    pub const fn engine(&self) -> EngineConfig {
        EngineConfig {
            max_retries: self.max_retries,
            backoff: self.backoff(),
            abort_when_offline: self.abort_when_offline,
            log_retention_days: self.log_retention_days,
        }
    }

    /// Latency of the stub transport.
    #[must_use]
    pub const fn transport_latency(&self) -> Duration {
        Duration::from_millis(self.transport_latency_ms)
    }
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self, TodoSyncError> {
        let paths = Paths::new()?;
        Self::load_from_path(&paths.config_file)
    }

    /// Load configuration from a specific path.
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load_from_path(path: &std::path::Path) -> Result<Self, TodoSyncError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            TodoSyncError::Config(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;

        serde_yaml::from_str(&contents).map_err(|e| {
            TodoSyncError::Config(format!(
                "Failed to parse config file {}: {e}",
                path.display()
            ))
        })
    }
}
