//! Client configuration.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Environment variable overriding the backend base URL (build time and runtime).
pub const API_BASE_URL_ENV: &str = "RPA_API_BASE_URL";

/// Environment variable overriding the log level at runtime.
pub const LOG_LEVEL_ENV: &str = "RPA_LOG_LEVEL";

/// Default backend base URL (can be overridden at compile time via RPA_API_BASE_URL).
pub const DEFAULT_API_BASE_URL: &str = match option_env!("RPA_API_BASE_URL") {
    Some(url) => url,
    None => "http://127.0.0.1:8000",
};

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default HTTP request timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Main client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Backend base URL shared by the user and admin surfaces.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Per-request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Try `/auth/refresh` once on a 401 before dropping the user session.
    #[serde(default)]
    pub refresh_on_unauthorized: bool,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            api_base_url: default_api_base_url(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            refresh_on_unauthorized: false,
        }
    }
}

impl Config {
    /// Create a new Config with default values, then override from environment.
    pub fn new() -> Self {
        let mut config = Self::default();
        config.load_from_env();
        config
    }

    /// Load configuration from the config file, falling back to defaults.
    ///
    /// Environment variables win over the file.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.load_from_env();
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    fn load_from_env(&mut self) {
        if let Some(url) = non_empty_env(API_BASE_URL_ENV) {
            self.api_base_url = url;
        }
        if let Some(level) = non_empty_env(LOG_LEVEL_ENV) {
            self.log_level = level;
        }
    }

    /// Reject settings that would make every request fail.
    pub fn validate(&self) -> CoreResult<()> {
        self.api_base_url()?;
        if self.timeout_ms == 0 {
            return Err(CoreError::Config("timeout_ms must be positive".to_string()));
        }
        Ok(())
    }

    /// Get the backend base URL as a parsed URL.
    pub fn api_base_url(&self) -> CoreResult<Url> {
        Url::parse(&self.api_base_url).map_err(CoreError::from)
    }

    /// Request timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|value| !value.is_empty())
}
