//! Configuration loading and resolution
//!
//! Every value has a compiled default, so a missing or partial TOML file is
//! never an error. Resolution priority for the config file location:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`GEOLENS_CONFIG`)
//! 3. Platform config directory (`~/.config/geolens/config.toml` on Linux)
//! 4. Compiled defaults only (no file)
//!
//! The Flickr API key is additionally overridable through
//! `GEOLENS_FLICKR_API_KEY` at runtime. Its compiled default is taken from the
//! same variable at build time.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "GEOLENS_CONFIG";

/// Environment variable overriding the Flickr API key
pub const API_KEY_ENV: &str = "GEOLENS_FLICKR_API_KEY";

/// Flickr REST endpoint
pub const DEFAULT_FLICKR_ENDPOINT: &str = "https://api.flickr.com/services/rest/";

/// API key baked in at build time (empty when the build environment has none)
pub const DEFAULT_API_KEY: &str = match option_env!("GEOLENS_FLICKR_API_KEY") {
    Some(key) => key,
    None => "",
};

/// Results requested per search
pub const DEFAULT_PER_PAGE: u32 = 10;

/// Flickr geo accuracy level (16 = street)
pub const DEFAULT_ACCURACY: u8 = 16;

/// Minimum time between two photo searches
pub const DEFAULT_COOLDOWN_SECS: u64 = 15;

/// Longest accepted cooldown (one day)
pub const MAX_COOLDOWN_SECS: u64 = 24 * 60 * 60;

/// HTTP request timeout for search and image requests
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

/// Complete configuration file contents
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub flickr: FlickrConfig,

    #[serde(default)]
    pub fetch: FetchConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Photo search API settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlickrConfig {
    /// REST endpoint URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// API key sent with every search
    #[serde(default = "default_api_key")]
    pub api_key: String,

    /// Page size for each search
    #[serde(default = "default_per_page")]
    pub per_page: u32,

    /// Geo accuracy level (1 = world .. 16 = street)
    #[serde(default = "default_accuracy")]
    pub accuracy: u8,
}

impl Default for FlickrConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: default_api_key(),
            per_page: default_per_page(),
            accuracy: default_accuracy(),
        }
    }
}

/// Fetch gate and download settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Seconds the fetch gate stays blocked after a search
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,

    /// HTTP timeout (seconds) for search and image requests
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: default_cooldown_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl FetchConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default tracing filter (trace, debug, info, warn, error or a directive list)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_endpoint() -> String {
    DEFAULT_FLICKR_ENDPOINT.to_string()
}

fn default_api_key() -> String {
    DEFAULT_API_KEY.to_string()
}

fn default_per_page() -> u32 {
    DEFAULT_PER_PAGE
}

fn default_accuracy() -> u8 {
    DEFAULT_ACCURACY
}

fn default_cooldown_secs() -> u64 {
    DEFAULT_COOLDOWN_SECS
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Resolve and load configuration, then apply environment overrides
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        let mut config = match resolve_config_path(cli_path, CONFIG_PATH_ENV) {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                load_toml_config(&path)?
            }
            None => {
                debug!("No configuration file found, using compiled defaults");
                TomlConfig::default()
            }
        };

        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                debug!("Flickr API key taken from {}", API_KEY_ENV);
                config.flickr.api_key = key;
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.flickr.per_page == 0 {
            return Err(Error::Config("flickr.per_page must be at least 1".to_string()));
        }
        if !(1..=16).contains(&self.flickr.accuracy) {
            return Err(Error::Config(format!(
                "flickr.accuracy must be between 1 and 16, got {}",
                self.flickr.accuracy
            )));
        }
        if self.fetch.cooldown_secs > MAX_COOLDOWN_SECS {
            return Err(Error::Config(format!(
                "fetch.cooldown_secs must be at most {}, got {}",
                MAX_COOLDOWN_SECS, self.fetch.cooldown_secs
            )));
        }
        if self.fetch.request_timeout_secs == 0 {
            return Err(Error::Config(
                "fetch.request_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Find the config file following the priority order in the module docs
///
/// An explicit CLI or environment path is returned even if it does not exist,
/// so that loading reports the missing file instead of silently using defaults.
pub fn resolve_config_path(cli_arg: Option<&Path>, env_var_name: &str) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Platform config directory
    default_config_path().filter(|p| p.exists())
}

/// Platform default location of the config file
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("geolens").join("config.toml"))
}

/// Read and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    let config = toml::from_str::<TomlConfig>(&content)?;
    Ok(config)
}

/// Write a config to disk, creating parent directories as needed
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
    std::fs::write(path, content)?;
    Ok(())
}
