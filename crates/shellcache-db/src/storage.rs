//! SQLite-backed cache storage
//!
//! Stores survive restarts; insertion order is the entry sequence number.

use async_trait::async_trait;
use shellcache_storage::{CacheStorage, CacheStore, ResponseSnapshot, StorageError};
use std::sync::Arc;
use tracing::debug;

use crate::error::DbError;
use crate::repository::Database;

/// Persistent collection of named stores
#[derive(Clone)]
pub struct SqliteStorage {
    db: Database,
}

impl SqliteStorage {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Open the database at `database_url` and wrap it
    pub async fn connect(database_url: &str) -> Result<Self, DbError> {
        Ok(Self::new(Database::new(database_url).await?))
    }
}

/// Handle to one store in the database
pub struct SqliteStore {
    db: Database,
    name: String,
}

#[async_trait]
impl CacheStore for SqliteStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, key: &str) -> Result<Option<ResponseSnapshot>, StorageError> {
        let entry = self.db.get_entry(&self.name, key).await?;
        Ok(entry.map(ResponseSnapshot::from))
    }

    async fn put(&self, key: &str, snapshot: ResponseSnapshot) -> Result<(), StorageError> {
        let seq = self.db.put_entry(&self.name, key, &snapshot).await?;
        debug!("Stored {} in {} (seq {})", key, self.name, seq);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.db.delete_entry(&self.name, key).await?)
    }

    async fn delete_if_seq(&self, key: &str, seq: u64) -> Result<bool, StorageError> {
        Ok(self
            .db
            .delete_entry_if_seq(&self.name, key, seq as i64)
            .await?)
    }

    async fn sequenced_keys(&self) -> Result<Vec<(u64, String)>, StorageError> {
        let keys = self.db.list_sequenced_keys(&self.name).await?;
        Ok(keys
            .into_iter()
            .map(|(seq, key)| (seq as u64, key))
            .collect())
    }

    async fn len(&self) -> Result<u64, StorageError> {
        Ok(self.db.count_entries(&self.name).await? as u64)
    }

    async fn clear(&self) -> Result<u64, StorageError> {
        Ok(self.db.clear_entries(&self.name).await?)
    }
}

#[async_trait]
impl CacheStorage for SqliteStorage {
    async fn open(&self, name: &str) -> Result<Arc<dyn CacheStore>, StorageError> {
        self.db.ensure_store(name).await?;
        Ok(Arc::new(SqliteStore {
            db: self.db.clone(),
            name: name.to_string(),
        }) as Arc<dyn CacheStore>)
    }

    async fn has(&self, name: &str) -> Result<bool, StorageError> {
        Ok(self.db.store_exists(name).await?)
    }

    async fn names(&self) -> Result<Vec<String>, StorageError> {
        let stores = self.db.list_stores().await?;
        Ok(stores.into_iter().map(|s| s.name).collect())
    }

    async fn delete(&self, name: &str) -> Result<bool, StorageError> {
        Ok(self.db.drop_store(name).await?)
    }
}
