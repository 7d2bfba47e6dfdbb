//! Cache store traits

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::StorageError;
use crate::snapshot::ResponseSnapshot;

/// A single named cache store
///
/// Keys are unique within a store and kept in insertion order. Writing an
/// existing key replaces its snapshot and moves it to the newest end.
/// Every individual operation is atomic; nothing spans two calls.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Name of this store, including its version tag
    fn name(&self) -> &str;

    /// Look up a snapshot by key
    async fn get(&self, key: &str) -> Result<Option<ResponseSnapshot>, StorageError>;

    /// Insert or replace a snapshot
    async fn put(&self, key: &str, snapshot: ResponseSnapshot) -> Result<(), StorageError>;

    /// Delete a key, returns whether it was present
    async fn delete(&self, key: &str) -> Result<bool, StorageError>;

    /// Delete `key` only while it still carries insertion sequence `seq`
    ///
    /// A key rewritten after `seq` was read has moved to the newest end and
    /// is left in place. Returns whether an entry was removed.
    async fn delete_if_seq(&self, key: &str, seq: u64) -> Result<bool, StorageError>;

    /// All keys with their insertion sequence, oldest first
    async fn sequenced_keys(&self) -> Result<Vec<(u64, String)>, StorageError>;

    /// All keys, oldest insertion first
    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self
            .sequenced_keys()
            .await?
            .into_iter()
            .map(|(_, key)| key)
            .collect())
    }

    /// Number of entries
    async fn len(&self) -> Result<u64, StorageError>;

    /// Remove every entry, returns how many were removed
    async fn clear(&self) -> Result<u64, StorageError>;
}

/// The collection of named stores owned by one client instance
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open a store, creating it if it does not exist yet
    async fn open(&self, name: &str) -> Result<Arc<dyn CacheStore>, StorageError>;

    /// Check whether a store exists
    async fn has(&self, name: &str) -> Result<bool, StorageError>;

    /// Names of all existing stores
    async fn names(&self) -> Result<Vec<String>, StorageError>;

    /// Drop a store and all of its entries
    async fn delete(&self, name: &str) -> Result<bool, StorageError>;
}

/// Split a store name (e.g., "static-v1") into purpose and version tag
pub fn parse_store_name(name: &str) -> Result<(&str, &str), StorageError> {
    match name.rsplit_once('-') {
        Some((purpose, version)) if !purpose.is_empty() && !version.is_empty() => {
            Ok((purpose, version))
        }
        _ => Err(StorageError::InvalidStoreName(format!(
            "Store name has no version tag: {}",
            name
        ))),
    }
}

/// Version tag of a store name, if it has one
pub fn version_tag(name: &str) -> Option<&str> {
    parse_store_name(name).ok().map(|(_, version)| version)
}
