//! Configuration loading and management

use anyhow::{Context, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use shellcache_core::{CacheSettings, SettingsProvider};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub origin: OriginConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    /// Cache version settings: stores, app shell, strategies
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

/// Application origin the proxy sits in front of
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OriginConfig {
    #[serde(default = "default_origin_url")]
    pub url: String,
    #[serde(default)]
    pub skip_tls_verify: bool,
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            url: default_origin_url(),
            skip_tls_verify: false,
        }
    }
}

/// Network fetch configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Whole-request timeout in seconds. Unset means no timeout: a hung
    /// origin keeps the caller waiting when there is no cached fallback.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl FetchConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Storage backend kind
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackendKind {
    /// Stores live in process memory and vanish on restart
    #[default]
    Memory,
    /// Stores persist in a SQLite database
    Sqlite,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackendKind,
    /// Database file for the sqlite backend
    #[serde(default = "default_db_path")]
    pub path: String,
    /// Per-store byte quota for the memory backend
    #[serde(default)]
    pub quota_bytes: Option<u64>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackendKind::default(),
            path: default_db_path(),
            quota_bytes: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// "pretty" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_origin_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_db_path() -> String {
    "./data/shellcache.db".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_metrics_enabled() -> bool {
    true
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &str) -> Result<Self> {
        let config_path = Path::new(path);

        // Check if config file exists
        if !config_path.exists() {
            info!("Config file not found at {}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        config
            .cache
            .validate()
            .with_context(|| format!("Invalid [cache] section in {}", path))?;

        info!("Loaded configuration from {}", path);
        Ok(config)
    }
}

/// Thread-safe configuration manager for runtime updates
#[derive(Clone)]
pub struct ConfigManager {
    config: Arc<RwLock<Config>>,
    path: String,
}

impl ConfigManager {
    /// Create a new config manager
    pub fn new(config: Config, path: String) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
            path,
        }
    }
}

impl SettingsProvider for ConfigManager {
    fn get_cache_settings(&self) -> CacheSettings {
        self.config.read().cache.clone()
    }

    /// Reload configuration from file
    ///
    /// Only the `[cache]` section takes effect without a restart.
    fn reload(&self) -> Result<()> {
        let new_config = Config::load(&self.path)?;
        *self.config.write() = new_config;
        info!("Configuration reloaded from {}", self.path);
        Ok(())
    }
}
