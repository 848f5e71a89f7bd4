//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/branch/config.toml`, then
//! selected environment variables override individual fields.
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/branch/` (~/.config/branch/)
//! - Data: `$XDG_DATA_HOME/branch/` (~/.local/share/branch/)
//! - State/Logs: `$XDG_STATE_HOME/branch/` (~/.local/state/branch/)
//!
//! A [`Config`] is built once at startup and handed by reference to whatever
//! needs it; there is no process-wide instance.

use crate::db::StorageLocation;
use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

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
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Where the store lives
    #[serde(default)]
    pub storage: StorageConfig,

    /// Optional integrations (carried, not acted on by this crate)
    #[serde(default)]
    pub features: FeatureFlags,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Storage location configuration
#[derive(Debug, Deserialize, Default, Clone)]
pub struct StorageConfig {
    /// Explicit location: `sqlite:///path`, a bare path, or `:memory:`
    pub database_url: Option<String>,

    /// Directory for the default database file
    pub data_dir: Option<PathBuf>,
}

impl StorageConfig {
    /// Directory holding the database file
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(Config::data_dir)
    }

    /// Resolve the storage location.
    ///
    /// `database_url` wins when set; otherwise `<data_dir>/branch.db`.
    pub fn location(&self) -> Result<StorageLocation> {
        match &self.database_url {
            Some(url) => url.parse(),
            None => Ok(StorageLocation::File(self.data_dir().join("branch.db"))),
        }
    }
}

/// Optional feature switches
#[derive(Debug, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
pub struct FeatureFlags {
    /// AI-assisted "Dive Deep" and review
    #[serde(default)]
    pub ai: bool,

    /// Voice capture of fragments
    #[serde(default)]
    pub voice_capture: bool,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,

    /// Directory for log files (defaults to the XDG state directory)
    pub directory: Option<PathBuf>,
}

impl LoggingConfig {
    pub fn log_dir(&self) -> PathBuf {
        self.directory.clone().unwrap_or_else(Config::state_dir)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
            directory: None,
        }
    }
}

/// File name used by the rolling log appender
pub const LOG_FILE_NAME: &str = "branch.log";

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

/// Only a case-insensitive "true" turns a flag on.
fn parse_flag(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

impl Config {
    /// Load configuration from the default path, then apply env overrides
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        let mut config = if config_path.exists() {
            Self::load_from(&config_path)?
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Config::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Override fields from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Override fields from any key/value source.
    ///
    /// Keys: `DATABASE_URL`, `DATA_DIR`, `LOG_LEVEL`, `ENABLE_AI_FEATURES`,
    /// `ENABLE_VOICE_CAPTURE`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DATABASE_URL") {
            self.storage.database_url = Some(url);
        }
        if let Some(dir) = lookup("DATA_DIR") {
            self.storage.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.logging.level = level.to_lowercase();
        }
        if let Some(flag) = lookup("ENABLE_AI_FEATURES") {
            self.features.ai = parse_flag(&flag);
        }
        if let Some(flag) = lookup("ENABLE_VOICE_CAPTURE") {
            self.features.voice_capture = parse_flag(&flag);
        }
    }

    /// Create the data directory and the log directory
    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(self.storage.data_dir())?;
        std::fs::create_dir_all(self.logging.log_dir())?;
        Ok(())
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/branch/config.toml` (~/.config/branch/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("branch").join("config.toml")
    }

    /// Returns the data directory path (for SQLite database)
    ///
    /// `$XDG_DATA_HOME/branch/` (~/.local/share/branch/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("branch")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/branch/` (~/.local/state/branch/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("branch")
    }

    /// Returns the default log file prefix
    ///
    /// `$XDG_STATE_HOME/branch/branch.log`; daily rotation appends the date.
    pub fn log_path() -> PathBuf {
        Self::state_dir().join(LOG_FILE_NAME)
    }
}
