//! Service configuration.
//!
//! Settings are resolved in three layers: built-in defaults, an optional
//! `pvdash.toml` file, then environment variable overrides.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

impl ConfigError {
    fn invalid(key: &str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

/// Top-level configuration file layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub analysis: AnalysisSettings,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum request body size, in megabytes
    #[serde(default = "default_body_limit_mb")]
    pub body_limit_mb: usize,
}

/// Knobs of the analysis engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSettings {
    /// Largest number of pixel combinations searched exhaustively per device,
    /// and of device combinations per sheet. Larger pixel pools fall back to a
    /// selection over the sorted values, larger device sets to a greedy pick.
    #[serde(default = "default_combination_limit")]
    pub combination_limit: u64,
    /// Percentile used for device-yield thresholds when the request gives none.
    #[serde(default = "default_yield_percentile")]
    pub yield_percentile: f64,
    /// Trailing window of distinct days for repeatability charts.
    #[serde(default = "default_repeatability_window_days")]
    pub repeatability_window_days: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_body_limit_mb() -> usize {
    50
}

fn default_combination_limit() -> u64 {
    10_000
}

fn default_yield_percentile() -> f64 {
    crate::services::device_yield::DEFAULT_YIELD_PERCENTILE
}

fn default_repeatability_window_days() -> usize {
    crate::services::repeatability::DEFAULT_WINDOW_DAYS
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_mb: default_body_limit_mb(),
        }
    }
}

impl ServerSettings {
    /// Request body limit in bytes, saturating at `usize::MAX`.
    pub fn body_limit_bytes(&self) -> usize {
        self.body_limit_mb.saturating_mul(1024 * 1024)
    }
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            combination_limit: default_combination_limit(),
            yield_percentile: default_yield_percentile(),
            repeatability_window_days: default_repeatability_window_days(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: AppConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Search for `pvdash.toml` in the standard locations.
    ///
    /// Searches, in order:
    /// 1. Current directory
    /// 2. `backend/` directory
    /// 3. Parent directory
    pub fn find_default_file() -> Option<PathBuf> {
        [
            PathBuf::from("pvdash.toml"),
            PathBuf::from("backend/pvdash.toml"),
            PathBuf::from("../pvdash.toml"),
        ]
        .into_iter()
        .find(|p| p.exists())
    }

    /// Resolve the full configuration: defaults, then file, then environment.
    ///
    /// # Environment Variables
    /// - `PVDASH_CONFIG`: explicit path to the TOML file
    /// - `HOST`, `PORT`: listener address
    /// - `PVDASH_COMBINATION_LIMIT`: exact-search cap
    /// - `PVDASH_YIELD_PERCENTILE`: default device-yield percentile
    /// - `PVDASH_REPEATABILITY_WINDOW`: default repeatability window in days
    pub fn load() -> Result<Self, ConfigError> {
        let file = env::var("PVDASH_CONFIG")
            .ok()
            .map(PathBuf::from)
            .or_else(Self::find_default_file);

        let mut config = match file {
            Some(path) => {
                log::info!("Loading configuration from {}", path.display());
                Self::from_file(path)?
            }
            None => Self::default(),
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay environment variables on top of the current values.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(host) = env::var("HOST") {
            self.server.host = host;
        }
        if let Some(port) = parse_env::<u16>("PORT")? {
            self.server.port = port;
        }
        if let Some(limit) = parse_env::<u64>("PVDASH_COMBINATION_LIMIT")? {
            self.analysis.combination_limit = limit;
        }
        if let Some(pct) = parse_env::<f64>("PVDASH_YIELD_PERCENTILE")? {
            self.analysis.yield_percentile = pct;
        }
        if let Some(days) = parse_env::<usize>("PVDASH_REPEATABILITY_WINDOW")? {
            self.analysis.repeatability_window_days = days;
        }
        Ok(())
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.body_limit_mb == 0 {
            return Err(ConfigError::invalid("server.body_limit_mb", "must be positive"));
        }
        if self.analysis.combination_limit == 0 {
            return Err(ConfigError::invalid(
                "analysis.combination_limit",
                "must be positive",
            ));
        }
        let pct = self.analysis.yield_percentile;
        if !(pct > 0.0 && pct < 100.0) {
            return Err(ConfigError::invalid(
                "analysis.yield_percentile",
                format!("{} is outside (0, 100)", pct),
            ));
        }
        if self.analysis.repeatability_window_days == 0 {
            return Err(ConfigError::invalid(
                "analysis.repeatability_window_days",
                "must be at least 1",
            ));
        }
        Ok(())
    }

    /// `host:port` string for binding the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::invalid(key, format!("cannot parse '{}'", raw))),
        Err(_) => Ok(None),
    }
}
