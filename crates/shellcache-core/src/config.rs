//! Shared configuration types for the caching layer
//!
//! The main config loading is done in the shellcache binary; these types
//! describe one cache version (store names, app shell, strategy bindings)
//! and are consumed by the worker and the lifecycle manager.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use shellcache_storage::parse_store_name;
use std::sync::Arc;

use crate::error::CoreError;
use crate::strategy::{Strategy, WritePolicy};

/// Store name prefixes, one per purpose
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorePrefixes {
    #[serde(default = "default_static_prefix")]
    pub static_shell: String,
    #[serde(default = "default_dynamic_prefix")]
    pub dynamic: String,
    #[serde(default = "default_api_store_prefix")]
    pub api: String,
}

impl Default for StorePrefixes {
    fn default() -> Self {
        Self {
            static_shell: default_static_prefix(),
            dynamic: default_dynamic_prefix(),
            api: default_api_store_prefix(),
        }
    }
}

/// Strategy bound to each request class
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StrategyConfig {
    #[serde(default = "default_static_strategy")]
    pub static_shell: Strategy,
    #[serde(default = "default_api_strategy")]
    pub api: Strategy,
    #[serde(default = "default_other_strategy")]
    pub other: Strategy,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            static_shell: default_static_strategy(),
            api: default_api_strategy(),
            other: default_other_strategy(),
        }
    }
}

/// Configuration of one cache version
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheSettings {
    /// Version tag embedded in every store name; bump it when the app shell
    /// or the bindings change
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub stores: StorePrefixes,
    /// Same-origin path prefix of API requests
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
    /// App shell paths pre-populated at install
    #[serde(default = "default_app_shell")]
    pub app_shell: Vec<String>,
    /// Entry ceiling of the dynamic store
    #[serde(default = "default_dynamic_max_entries")]
    pub dynamic_max_entries: u64,
    #[serde(default)]
    pub write_policy: WritePolicy,
    /// Guard background refreshes with a per-key issue sequence so an older
    /// refresh never overwrites a newer one. Off: last completed write wins.
    #[serde(default)]
    pub ordered_revalidation: bool,
    #[serde(default)]
    pub strategies: StrategyConfig,
    /// Periodic re-registration interval; disabled when unset
    #[serde(default)]
    pub update_interval_secs: Option<u64>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            version: default_version(),
            stores: StorePrefixes::default(),
            api_prefix: default_api_prefix(),
            app_shell: default_app_shell(),
            dynamic_max_entries: default_dynamic_max_entries(),
            write_policy: WritePolicy::default(),
            ordered_revalidation: false,
            strategies: StrategyConfig::default(),
            update_interval_secs: None,
        }
    }
}

impl CacheSettings {
    /// Store names for this version
    pub fn store_names(&self) -> StoreNames {
        StoreNames::for_version(&self.stores, &self.version)
    }

    /// Check the settings before building a worker from them
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.version.is_empty() || self.version.contains('-') {
            return Err(CoreError::InvalidConfig(format!(
                "version tag must be non-empty and contain no '-': {:?}",
                self.version
            )));
        }

        if !self.api_prefix.starts_with('/') {
            return Err(CoreError::InvalidConfig(format!(
                "api_prefix must start with '/': {}",
                self.api_prefix
            )));
        }

        if let Some(path) = self.app_shell.iter().find(|p| !p.starts_with('/')) {
            return Err(CoreError::InvalidConfig(format!(
                "app shell entries must be absolute paths: {}",
                path
            )));
        }

        if self.dynamic_max_entries == 0 {
            return Err(CoreError::InvalidConfig(
                "dynamic_max_entries must be at least 1".to_string(),
            ));
        }

        let names = self.store_names();
        let all = names.all();
        for name in &all {
            parse_store_name(name)?;
        }
        if all[0] == all[1] || all[1] == all[2] || all[0] == all[2] {
            return Err(CoreError::InvalidConfig(
                "store prefixes must be distinct".to_string(),
            ));
        }

        Ok(())
    }
}

/// Names of the stores belonging to one version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreNames {
    pub static_shell: String,
    pub dynamic: String,
    pub api: String,
}

impl StoreNames {
    pub fn for_version(prefixes: &StorePrefixes, version: &str) -> Self {
        Self {
            static_shell: format!("{}-{}", prefixes.static_shell, version),
            dynamic: format!("{}-{}", prefixes.dynamic, version),
            api: format!("{}-{}", prefixes.api, version),
        }
    }

    pub fn all(&self) -> [&str; 3] {
        [&self.static_shell, &self.dynamic, &self.api]
    }

    pub fn contains(&self, name: &str) -> bool {
        self.all().contains(&name)
    }
}

fn default_version() -> String {
    "v1".to_string()
}

fn default_static_prefix() -> String {
    "static".to_string()
}

fn default_dynamic_prefix() -> String {
    "dynamic".to_string()
}

fn default_api_store_prefix() -> String {
    "api".to_string()
}

fn default_api_prefix() -> String {
    "/api/".to_string()
}

fn default_app_shell() -> Vec<String> {
    [
        "/",
        "/index.html",
        "/manifest.json",
        "/favicon.ico",
        "/logo192.png",
        "/logo512.png",
    ]
    .iter()
    .map(|p| p.to_string())
    .collect()
}

fn default_dynamic_max_entries() -> u64 {
    50
}

fn default_static_strategy() -> Strategy {
    Strategy::CacheFirst
}

fn default_api_strategy() -> Strategy {
    Strategy::StaleWhileRevalidate
}

fn default_other_strategy() -> Strategy {
    Strategy::NetworkFirst
}

/// Trait for providing cache settings
///
/// This allows the config to be managed externally (e.g., by the binary's
/// config file) while the update task re-reads it.
pub trait SettingsProvider: Send + Sync {
    /// Current cache settings
    fn get_cache_settings(&self) -> CacheSettings;

    /// Re-read settings from their source
    fn reload(&self) -> anyhow::Result<()>;
}

/// A simple in-memory implementation of SettingsProvider for testing
/// or when no persistence is needed
pub struct InMemorySettingsProvider {
    settings: Arc<RwLock<CacheSettings>>,
}

impl InMemorySettingsProvider {
    pub fn new(settings: CacheSettings) -> Self {
        Self {
            settings: Arc::new(RwLock::new(settings)),
        }
    }

    /// Replace the settings returned by the next `get_cache_settings`
    pub fn set(&self, settings: CacheSettings) {
        *self.settings.write() = settings;
    }
}

impl SettingsProvider for InMemorySettingsProvider {
    fn get_cache_settings(&self) -> CacheSettings {
        self.settings.read().clone()
    }

    fn reload(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_names_embed_version() {
        let settings = CacheSettings {
            version: "v7".to_string(),
            ..CacheSettings::default()
        };
        let names = settings.store_names();

        assert_eq!(names.static_shell, "static-v7");
        assert_eq!(names.dynamic, "dynamic-v7");
        assert_eq!(names.api, "api-v7");
        assert!(names.contains("api-v7"));
        assert!(!names.contains("api-v6"));
    }

    #[test]
    fn test_default_settings_are_valid() {
        CacheSettings::default().validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        let dashed = CacheSettings {
            version: "v1-beta".to_string(),
            ..CacheSettings::default()
        };
        assert!(dashed.validate().is_err());

        let relative = CacheSettings {
            app_shell: vec!["index.html".to_string()],
            ..CacheSettings::default()
        };
        assert!(relative.validate().is_err());

        let unbounded = CacheSettings {
            dynamic_max_entries: 0,
            ..CacheSettings::default()
        };
        assert!(unbounded.validate().is_err());

        let clashing = CacheSettings {
            stores: StorePrefixes {
                static_shell: "shared".to_string(),
                dynamic: "shared".to_string(),
                api: "api".to_string(),
            },
            ..CacheSettings::default()
        };
        assert!(clashing.validate().is_err());
    }

    #[test]
    fn test_deserialize_partial_settings() {
        let settings: CacheSettings = toml::from_str(
            r#"
            version = "v2"
            app_shell = ["/", "/app.js"]

            [strategies]
            other = "cache-first"
            "#,
        )
        .unwrap();

        assert_eq!(settings.version, "v2");
        assert_eq!(settings.app_shell, vec!["/", "/app.js"]);
        assert_eq!(settings.strategies.other, Strategy::CacheFirst);
        assert_eq!(settings.strategies.api, Strategy::StaleWhileRevalidate);
        assert_eq!(settings.dynamic_max_entries, 50);
    }

    #[test]
    fn test_in_memory_provider() {
        let provider = InMemorySettingsProvider::new(CacheSettings::default());
        assert_eq!(provider.get_cache_settings().version, "v1");

        provider.set(CacheSettings {
            version: "v2".to_string(),
            ..CacheSettings::default()
        });
        provider.reload().unwrap();
        assert_eq!(provider.get_cache_settings().version, "v2");
    }
}
