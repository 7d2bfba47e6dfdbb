//! In-memory storage backend

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info};

use crate::backend::{CacheStore, CacheStorage};
use crate::error::StorageError;
use crate::snapshot::ResponseSnapshot;

#[derive(Default)]
struct Entries {
    /// Monotonic insertion counter
    next_seq: u64,
    by_key: HashMap<String, (u64, ResponseSnapshot)>,
    /// Insertion sequence -> key, oldest first
    order: BTreeMap<u64, String>,
    total_bytes: u64,
}

/// In-memory cache store
///
/// The lock is held for the duration of a single operation only.
pub struct MemoryStore {
    name: String,
    quota_bytes: Option<u64>,
    entries: Mutex<Entries>,
}

impl MemoryStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quota_bytes: None,
            entries: Mutex::new(Entries::default()),
        }
    }

    /// Create a store that rejects writes pushing its body total past `quota_bytes`
    pub fn with_quota(name: impl Into<String>, quota_bytes: u64) -> Self {
        Self {
            quota_bytes: Some(quota_bytes),
            ..Self::new(name)
        }
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, key: &str) -> Result<Option<ResponseSnapshot>, StorageError> {
        let entries = self.entries.lock();
        Ok(entries.by_key.get(key).map(|(_, s)| s.clone()))
    }

    async fn put(&self, key: &str, snapshot: ResponseSnapshot) -> Result<(), StorageError> {
        let mut entries = self.entries.lock();

        let replaced_size = entries
            .by_key
            .get(key)
            .map(|(_, s)| s.size())
            .unwrap_or(0);

        if let Some(quota) = self.quota_bytes {
            let projected = entries.total_bytes - replaced_size + snapshot.size();
            if projected > quota {
                return Err(StorageError::QuotaExceeded {
                    store: self.name.clone(),
                    message: format!("{} bytes needed, quota is {}", projected, quota),
                });
            }
        }

        let seq = entries.next_seq;
        entries.next_seq += 1;

        let size = snapshot.size();
        if let Some((old_seq, _)) = entries.by_key.insert(key.to_string(), (seq, snapshot)) {
            entries.order.remove(&old_seq);
        }
        entries.order.insert(seq, key.to_string());
        entries.total_bytes = entries.total_bytes - replaced_size + size;

        debug!("Stored {} in {} ({} bytes)", key, self.name, size);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        let mut entries = self.entries.lock();
        match entries.by_key.remove(key) {
            Some((seq, snapshot)) => {
                entries.order.remove(&seq);
                entries.total_bytes -= snapshot.size();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_if_seq(&self, key: &str, seq: u64) -> Result<bool, StorageError> {
        let mut entries = self.entries.lock();
        if entries.by_key.get(key).map(|(current, _)| *current) != Some(seq) {
            return Ok(false);
        }

        if let Some((_, snapshot)) = entries.by_key.remove(key) {
            entries.order.remove(&seq);
            entries.total_bytes -= snapshot.size();
        }
        Ok(true)
    }

    async fn sequenced_keys(&self) -> Result<Vec<(u64, String)>, StorageError> {
        let entries = self.entries.lock();
        Ok(entries
            .order
            .iter()
            .map(|(seq, key)| (*seq, key.clone()))
            .collect())
    }

    async fn len(&self) -> Result<u64, StorageError> {
        Ok(self.entries.lock().by_key.len() as u64)
    }

    async fn clear(&self) -> Result<u64, StorageError> {
        let mut entries = self.entries.lock();
        let count = entries.by_key.len() as u64;
        entries.by_key.clear();
        entries.order.clear();
        entries.total_bytes = 0;
        Ok(count)
    }
}

/// In-memory collection of named stores
///
/// Contents live for the lifetime of the process.
#[derive(Default)]
pub struct MemoryStorage {
    quota_bytes: Option<u64>,
    stores: RwLock<BTreeMap<String, Arc<MemoryStore>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        info!("Initialized in-memory cache storage");
        Self::default()
    }

    /// Every store opened through this storage gets the given byte quota
    pub fn with_quota(quota_bytes: u64) -> Self {
        info!(
            "Initialized in-memory cache storage (quota: {} bytes per store)",
            quota_bytes
        );
        Self {
            quota_bytes: Some(quota_bytes),
            stores: RwLock::new(BTreeMap::new()),
        }
    }
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn open(&self, name: &str) -> Result<Arc<dyn CacheStore>, StorageError> {
        if let Some(store) = self.stores.read().get(name) {
            return Ok(store.clone() as Arc<dyn CacheStore>);
        }

        let mut stores = self.stores.write();
        let store = stores
            .entry(name.to_string())
            .or_insert_with(|| {
                debug!("Creating store {}", name);
                Arc::new(match self.quota_bytes {
                    Some(quota) => MemoryStore::with_quota(name, quota),
                    None => MemoryStore::new(name),
                })
            })
            .clone();
        Ok(store as Arc<dyn CacheStore>)
    }

    async fn has(&self, name: &str) -> Result<bool, StorageError> {
        Ok(self.stores.read().contains_key(name))
    }

    async fn names(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.stores.read().keys().cloned().collect())
    }

    async fn delete(&self, name: &str) -> Result<bool, StorageError> {
        Ok(self.stores.write().remove(name).is_some())
    }
}
