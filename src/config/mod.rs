//! Configuration for the store and its operator CLI
//!
//! Supports loading configuration from:
//! 1. CLI --config argument
//! 2. ~/.config/osint-store/config.{OSINT_ENV}.json
//! 3. Default values
//!
//! Where OSINT_ENV can be: production (default), development, test
//!
//! # Examples
//!
//! ```no_run
//! use osint_store::config::AppConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load(None)?;
//! println!("Database: {}", config.database.path.display());
//! # Ok(())
//! # }
//! ```
//!
//! ## Environment Variables
//!
//! Environment variables override config file values:
//! - OSINT_DB_PATH
//! - OSINT_DB_MAX_CONNECTIONS
//! - OSINT_DEBUG

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config JSON: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Where the database lives and how connections to it are opened
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file path
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    /// Upper bound on simultaneously open connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// How long SQLite waits on a locked database before failing
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_secs: u64,
}

fn default_db_path() -> PathBuf {
    ProjectDirs::from("com", "osint-store", "osint-store")
        .map(|dirs| dirs.data_dir().join("osint_bot.db"))
        .unwrap_or_else(|| PathBuf::from("osint_bot.db"))
}

fn default_max_connections() -> u32 {
    5
}

fn default_busy_timeout() -> u64 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            max_connections: default_max_connections(),
            busy_timeout_secs: default_busy_timeout(),
        }
    }
}

impl DatabaseConfig {
    /// Settings for a database at `path`, defaults otherwise
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.path.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "database.path cannot be empty".to_string(),
            ));
        }

        if self.max_connections == 0 {
            return Err(ConfigError::ValidationError(
                "database.max_connections must be greater than 0".to_string(),
            ));
        }

        if self.busy_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "database.busy_timeout_secs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Limits and windows used when a caller does not pass its own
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryDefaults {
    pub users_page_size: u32,
    pub recent_days: u32,
    pub inactive_days: u32,
    pub lookups_limit: u32,
    pub leaderboard_limit: u32,
    pub daily_stats_days: u32,
    pub lookup_stats_limit: u32,
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self {
            users_page_size: 100,
            recent_days: 7,
            inactive_days: 30,
            lookups_limit: 10,
            leaderboard_limit: 10,
            daily_stats_days: 7,
            lookup_stats_limit: 10,
        }
    }
}

impl QueryDefaults {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let limits = [
            ("users_page_size", self.users_page_size),
            ("lookups_limit", self.lookups_limit),
            ("leaderboard_limit", self.leaderboard_limit),
            ("lookup_stats_limit", self.lookup_stats_limit),
        ];

        for (name, value) in limits {
            if value == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "defaults.{} must be greater than 0",
                    name
                )));
            }
        }

        Ok(())
    }
}

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub defaults: QueryDefaults,

    /// Enable debug logging
    #[serde(default)]
    pub debug: bool,
}

impl AppConfig {
    /// Load configuration from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: AppConfig = serde_json::from_str(&content)?;

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Load configuration with standard priority:
    /// 1. Explicit path
    /// 2. ~/.config/osint-store/config.{OSINT_ENV}.json
    /// 3. Defaults
    pub fn load(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit_path {
            if path.exists() {
                tracing::info!("Loading config from: {:?}", path);
                return Self::from_file(path);
            } else {
                return Err(ConfigError::ValidationError(format!(
                    "Config file not found: {:?}",
                    path
                )));
            }
        }

        let env = std::env::var("OSINT_ENV").unwrap_or_else(|_| "production".to_string());

        if let Some(config_dir) = Self::config_dir() {
            let config_path = config_dir.join(format!("config.{}.json", env));

            if config_path.exists() {
                tracing::info!("Loading config from: {:?}", config_path);
                return Self::from_file(&config_path);
            }
        }

        tracing::info!("Using default configuration with environment overrides");
        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("OSINT_DB_PATH") {
            self.database.path = PathBuf::from(path);
        }

        if let Some(max) = lookup("OSINT_DB_MAX_CONNECTIONS") {
            match max.parse() {
                Ok(max) => self.database.max_connections = max,
                Err(_) => tracing::warn!("Ignoring invalid OSINT_DB_MAX_CONNECTIONS: {}", max),
            }
        }

        if let Some(debug) = lookup("OSINT_DEBUG") {
            self.debug = debug.eq_ignore_ascii_case("true")
                || debug == "1"
                || debug.eq_ignore_ascii_case("yes");
        }
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.database.validate()?;
        self.defaults.validate()?;
        Ok(())
    }

    /// Get the config directory path
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("osint-store"))
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
