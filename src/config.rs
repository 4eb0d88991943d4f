//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::emotion::Granularity;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub dashboard: DashboardConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where emotion entries come from
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Memory,
    /// The file `emotrack log` appends to
    #[default]
    Csv,
    Http,
}

impl std::str::FromStr for SourceKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(SourceKind::Memory),
            "csv" => Ok(SourceKind::Csv),
            "http" => Ok(SourceKind::Http),
            other => Err(ConfigError::Invalid(format!("unknown source kind '{}'", other))),
        }
    }
}

/// Entry source configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub kind: SourceKind,

    /// CSV file used when `kind = "csv"`
    #[serde(default = "default_csv_path")]
    pub csv_path: Option<PathBuf>,

    /// Backend base URL used when `kind = "http"`
    #[serde(default = "default_url")]
    pub url: String,

    /// Bearer token for the backend
    #[serde(default)]
    pub token: Option<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

fn default_csv_path() -> Option<PathBuf> {
    Some(
        dirs::data_local_dir()
            .map(|p| p.join("emotrack").join("emotions.csv"))
            .unwrap_or_else(|| PathBuf::from("./emotions.csv")),
    )
}

fn default_url() -> String {
    "http://localhost:8090".to_string()
}

fn default_request_timeout() -> u64 {
    5000
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::default(),
            csv_path: default_csv_path(),
            url: default_url(),
            token: None,
            request_timeout_ms: default_request_timeout(),
        }
    }
}

/// Stats dashboard configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    /// Window width shown when a dashboard opens
    #[serde(default)]
    pub default_window: Granularity,

    /// Capacity of the event broadcast channel
    #[serde(default = "default_broadcast_capacity")]
    pub broadcast_capacity: usize,
}

fn default_broadcast_capacity() -> usize {
    64
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            default_window: Granularity::default(),
            broadcast_capacity: default_broadcast_capacity(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::from_toml_str(&content).map_err(|e| match e {
            ConfigError::Parse { error, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                error,
            },
            other => other,
        })
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: PathBuf::new(),
            error: e.to_string(),
        })
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("emotrack").join("config.toml")),
            Some(PathBuf::from("./emotrack.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::debug!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        // Source overrides
        if let Some(kind) = var("EMOTRACK_SOURCE_KIND") {
            match kind.parse() {
                Ok(k) => self.source.kind = k,
                Err(e) => tracing::warn!("Ignoring EMOTRACK_SOURCE_KIND: {}", e),
            }
        }
        if let Some(url) = var("EMOTRACK_SOURCE_URL") {
            self.source.url = url;
        }
        if let Some(token) = var("EMOTRACK_SOURCE_TOKEN") {
            self.source.token = Some(token);
        }
        if let Some(path) = var("EMOTRACK_CSV_PATH") {
            self.source.csv_path = Some(PathBuf::from(path));
        }

        // Logging overrides
        if let Some(level) = var("EMOTRACK_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("EMOTRACK_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Emotrack Configuration
#
# Environment variables override these settings:
# - EMOTRACK_SOURCE_KIND
# - EMOTRACK_SOURCE_URL
# - EMOTRACK_SOURCE_TOKEN
# - EMOTRACK_CSV_PATH
# - EMOTRACK_LOG_LEVEL
# - EMOTRACK_LOG_FORMAT

[source]
# Where entries are read from: memory, csv or http
kind = "csv"

# CSV export used when kind = "csv"
csv_path = "./emotions.csv"

# Backend base URL used when kind = "http"
url = "http://localhost:8090"

# Request timeout in milliseconds
request_timeout_ms = 5000

[dashboard]
# Window shown when a dashboard opens: day, week, month or year
default_window = "month"

# Capacity of the dashboard event channel
broadcast_capacity = 64

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
