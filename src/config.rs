//! Runtime configuration.
//!
//! Read from `~/.config/portfolio-dash/config.toml` when present, then
//! overridden by environment variables:
//!
//! - `PORTFOLIO_DASH_API_URL` replaces `api.base_url`
//! - `PORTFOLIO_DASH_LOG` replaces `log.level`
//! - `DEMO=1` / `DEMO=true` serves the built-in dataset instead of HTTP
//!
//! ```toml
//! [api]
//! base_url = "http://localhost:8000"
//! timeout_secs = 10
//!
//! [refresh]
//! market_secs = 30
//! portfolio_secs = 60
//! backoff_threshold = 3
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::model::SeriesId;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub refresh: RefreshConfig,
    pub auth: AuthConfig,
    pub log: LogConfig,
    #[serde(skip)]
    pub demo: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    pub portfolio_secs: u64,
    pub market_secs: u64,
    pub team_secs: u64,
    pub news_secs: u64,
    /// Consecutive failures before the interval starts widening; 0 disables
    pub backoff_threshold: u32,
    /// Upper bound on the widened interval, as a multiple of the base
    pub max_backoff_factor: u32,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            portfolio_secs: 60,
            market_secs: 30,
            team_secs: 300,
            news_secs: 120,
            backoff_threshold: 3,
            max_backoff_factor: 8,
        }
    }
}

impl RefreshConfig {
    pub fn interval(&self, series: SeriesId) -> Duration {
        let secs = match series {
            SeriesId::Portfolio => self.portfolio_secs,
            SeriesId::Market => self.market_secs,
            SeriesId::Team => self.team_secs,
            SeriesId::News => self.news_secs,
        };
        Duration::from_secs(secs)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Show the login dialog at launch instead of signing in as guest
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub file: PathBuf,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: Config::cache_dir().join("portfolio-dash.log"),
        }
    }
}

impl Config {
    pub fn config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_default()
            .join(".config/portfolio-dash")
    }

    pub fn cache_dir() -> PathBuf {
        PathBuf::from("/tmp/portfolio-dash")
    }

    /// Load from the default location and apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file(&Self::config_dir().join("config.toml"))?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse `path`; a missing file yields defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("PORTFOLIO_DASH_API_URL").filter(|v| !v.trim().is_empty()) {
            self.api.base_url = url.trim().to_string();
        }
        if let Some(level) = lookup("PORTFOLIO_DASH_LOG").filter(|v| !v.trim().is_empty()) {
            self.log.level = level;
        }
        self.demo = lookup("DEMO")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("api.base_url is empty".into()));
        }
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::Invalid("api.timeout_secs must be positive".into()));
        }
        for series in SeriesId::ALL {
            if self.refresh.interval(series).is_zero() {
                return Err(ConfigError::Invalid(format!(
                    "refresh interval for {series} must be positive"
                )));
            }
        }
        if self.refresh.max_backoff_factor == 0 {
            return Err(ConfigError::Invalid(
                "refresh.max_backoff_factor must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }
}
