//! Registration of the active cache version
//!
//! Holds at most one active worker. A new version is installed and activated
//! next to the current one, then swapped in; requests already running on
//! the old worker finish there.

use parking_lot::RwLock;
use serde::Serialize;
use shellcache_fetch::Fetcher;
use shellcache_storage::CacheStorage;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::{CacheSettings, SettingsProvider};
use crate::error::CoreError;
use crate::lifecycle::LifecycleState;
use crate::request::CacheRequest;
use crate::worker::{Handled, Worker};

/// Result of a successful registration
#[derive(Debug, Clone, Serialize)]
pub struct RegisterOutcome {
    pub version: String,
    pub previous_version: Option<String>,
    pub installed_assets: usize,
    pub deleted_stores: Vec<String>,
}

/// Snapshot of the active version
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationStatus {
    pub version: Option<String>,
    pub state: LifecycleState,
}

pub struct Registration {
    origin: Url,
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    active: RwLock<Option<Arc<Worker>>>,
    update_lock: Mutex<()>,
}

impl Registration {
    pub fn new(origin: Url, storage: Arc<dyn CacheStorage>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            origin,
            storage,
            fetcher,
            active: RwLock::new(None),
            update_lock: Mutex::new(()),
        }
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn storage(&self) -> &Arc<dyn CacheStorage> {
        &self.storage
    }

    /// The worker handling new requests, if any version is active
    pub fn active(&self) -> Option<Arc<Worker>> {
        self.active.read().clone()
    }

    pub fn status(&self) -> RegistrationStatus {
        match self.active() {
            Some(worker) => RegistrationStatus {
                version: Some(worker.version().to_string()),
                state: worker.lifecycle().state(),
            },
            None => RegistrationStatus {
                version: None,
                state: LifecycleState::Unregistered,
            },
        }
    }

    /// Install and activate a version built from `settings`
    ///
    /// Updates are serialized. On any failure the current worker keeps
    /// serving.
    pub async fn register(&self, settings: &CacheSettings) -> Result<RegisterOutcome, CoreError> {
        let _guard = self.update_lock.lock().await;

        let worker = Arc::new(Worker::new(
            settings,
            self.origin.clone(),
            self.storage.clone(),
            self.fetcher.clone(),
        )?);

        let installed_assets = worker.lifecycle().install().await?;
        let deleted_stores = worker.lifecycle().activate().await?;

        let previous = self.active.write().replace(worker.clone());
        let previous_version = previous.map(|old| {
            old.lifecycle().mark_redundant();
            old.version().to_string()
        });

        info!(
            "Version {} is now active (previous: {})",
            worker.version(),
            previous_version.as_deref().unwrap_or("none")
        );

        Ok(RegisterOutcome {
            version: worker.version().to_string(),
            previous_version,
            installed_assets,
            deleted_stores,
        })
    }

    /// Answer a GET through the active worker, or straight from the network
    /// when no version is active
    pub async fn handle(&self, request: &CacheRequest) -> Result<Handled, CoreError> {
        match self.active() {
            Some(worker) => worker.handle(request).await,
            None => {
                debug!("No active version, passing {} through", request.url);
                let response = self.fetcher.fetch(&request.url, &request.headers).await?;
                Ok(Handled::passthrough(response))
            }
        }
    }
}

/// Spawn a background task that periodically re-registers from `provider`
pub fn spawn_update_task(
    registration: Arc<Registration>,
    provider: Arc<dyn SettingsProvider>,
    interval_secs: u64,
) -> tokio::task::JoinHandle<()> {
    use tokio::time::{Duration, interval};

    info!(
        "Starting background update task (interval: {} seconds)",
        interval_secs
    );

    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(interval_secs));

        // Skip the first tick (which fires immediately)
        ticker.tick().await;

        loop {
            ticker.tick().await;
            debug!("Running scheduled update check");

            if let Err(e) = provider.reload() {
                warn!("Failed to reload settings: {}", e);
            }

            let settings = provider.get_cache_settings();
            match registration.register(&settings).await {
                Ok(outcome) => {
                    if !outcome.deleted_stores.is_empty() {
                        info!(
                            "Scheduled update to {} removed {} stores",
                            outcome.version,
                            outcome.deleted_stores.len()
                        );
                    }
                }
                Err(e) => {
                    warn!("Scheduled update failed: {}", e);
                }
            }
        }
    })
}
