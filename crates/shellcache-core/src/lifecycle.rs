//! Install and activation of a cache version

use futures::future::join_all;
use http::HeaderMap;
use parking_lot::RwLock;
use serde::Serialize;
use shellcache_fetch::Fetcher;
use shellcache_storage::{CacheStorage, ResponseSnapshot, version_tag};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::{CacheSettings, StoreNames};
use crate::error::CoreError;
use crate::request::CacheRequest;

/// Lifecycle state of one cache version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Unregistered,
    Installing,
    Installed,
    Activating,
    Active,
    /// Superseded by a newer version; finishes in-flight requests only
    Redundant,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Unregistered => "unregistered",
            LifecycleState::Installing => "installing",
            LifecycleState::Installed => "installed",
            LifecycleState::Activating => "activating",
            LifecycleState::Active => "active",
            LifecycleState::Redundant => "redundant",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Drives one version from `Unregistered` to `Active`
pub struct Lifecycle {
    version: String,
    stores: StoreNames,
    origin: Url,
    app_shell: Vec<String>,
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    state: RwLock<LifecycleState>,
}

impl Lifecycle {
    pub fn new(
        settings: &CacheSettings,
        origin: Url,
        storage: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        Self {
            version: settings.version.clone(),
            stores: settings.store_names(),
            origin,
            app_shell: settings.app_shell.clone(),
            storage,
            fetcher,
            state: RwLock::new(LifecycleState::Unregistered),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn stores(&self) -> &StoreNames {
        &self.stores
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.read()
    }

    fn transition(&self, from: LifecycleState, to: LifecycleState) -> Result<(), CoreError> {
        let mut state = self.state.write();
        if *state != from {
            return Err(CoreError::InvalidState(format!(
                "version {} cannot move to {} from {}",
                self.version, to, *state
            )));
        }
        *state = to;
        Ok(())
    }

    fn set_state(&self, to: LifecycleState) {
        *self.state.write() = to;
    }

    /// Pre-populate the static store with the app shell
    ///
    /// All-or-nothing: every asset is fetched before any is written, and a
    /// failure leaves no static store behind that this call created. On
    /// failure the version returns to `Unregistered` so a later attempt can
    /// retry. Returns the number of assets cached.
    pub async fn install(&self) -> Result<usize, CoreError> {
        self.transition(LifecycleState::Unregistered, LifecycleState::Installing)?;
        info!(
            "Installing version {} ({} app shell assets)",
            self.version,
            self.app_shell.len()
        );

        match self.populate().await {
            Ok(count) => {
                self.set_state(LifecycleState::Installed);
                info!("Installed version {}", self.version);
                Ok(count)
            }
            Err(e) => {
                self.set_state(LifecycleState::Unregistered);
                warn!("Install of version {} failed: {}", self.version, e);
                Err(e)
            }
        }
    }

    async fn populate(&self) -> Result<usize, CoreError> {
        let mut requests = Vec::with_capacity(self.app_shell.len());
        for path in &self.app_shell {
            let url = self.origin.join(path).map_err(|e| {
                CoreError::InvalidConfig(format!("app shell path {}: {}", path, e))
            })?;
            requests.push((path.as_str(), CacheRequest::get(url)));
        }

        let headers = HeaderMap::new();
        let results = join_all(
            requests
                .iter()
                .map(|(_, request)| self.fetcher.fetch(&request.url, &headers)),
        )
        .await;

        let mut fetched: Vec<(String, ResponseSnapshot)> = Vec::with_capacity(results.len());
        let mut failed = Vec::new();
        for ((path, request), result) in requests.iter().zip(results) {
            match result {
                Ok(response) if response.is_success() => {
                    fetched.push((request.key(), response));
                }
                Ok(response) => failed.push(format!("{} (status {})", path, response.status)),
                Err(e) => failed.push(format!("{} ({})", path, e)),
            }
        }

        if !failed.is_empty() {
            return Err(CoreError::InstallFailed {
                version: self.version.clone(),
                failed,
            });
        }

        let existed = self.storage.has(&self.stores.static_shell).await?;
        let store = self.storage.open(&self.stores.static_shell).await?;

        for (key, response) in fetched {
            if let Err(e) = store.put(&key, response).await {
                if !existed {
                    self.discard_static_store().await;
                }
                return Err(CoreError::InstallFailed {
                    version: self.version.clone(),
                    failed: vec![format!("{} ({})", key, e)],
                });
            }
            debug!("Pre-cached {} in {}", key, self.stores.static_shell);
        }

        Ok(self.app_shell.len())
    }

    async fn discard_static_store(&self) {
        if let Err(e) = self.storage.delete(&self.stores.static_shell).await {
            warn!(
                "Failed to discard partial store {}: {}",
                self.stores.static_shell, e
            );
        }
    }

    /// Delete every store whose version tag differs from this version
    ///
    /// Names without a version tag count as foreign. Returns the names
    /// deleted, then marks the version `Active`.
    pub async fn activate(&self) -> Result<Vec<String>, CoreError> {
        self.transition(LifecycleState::Installed, LifecycleState::Activating)?;

        let names = match self.storage.names().await {
            Ok(names) => names,
            Err(e) => {
                self.set_state(LifecycleState::Installed);
                return Err(e.into());
            }
        };

        let mut deleted = Vec::new();
        for name in names {
            if version_tag(&name) == Some(self.version.as_str()) {
                continue;
            }
            match self.storage.delete(&name).await {
                Ok(true) => {
                    info!("Deleted store {} from a previous version", name);
                    deleted.push(name);
                }
                Ok(false) => {}
                Err(e) => warn!("Failed to delete store {}: {}", name, e),
            }
        }

        self.set_state(LifecycleState::Active);
        info!(
            "Activated version {} ({} old stores deleted)",
            self.version,
            deleted.len()
        );
        Ok(deleted)
    }

    /// Mark this version superseded
    pub fn mark_redundant(&self) {
        self.set_state(LifecycleState::Redundant);
        debug!("Version {} is now redundant", self.version);
    }
}
