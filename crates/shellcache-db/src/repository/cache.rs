//! Cache entry operations

use chrono::Utc;
use shellcache_storage::ResponseSnapshot;
use sqlx::Row;

use crate::error::DbError;
use crate::models::EntryRecord;
use crate::repository::Database;

impl Database {
    // ==================== Cache Entry Operations ====================

    /// Insert or replace an entry, returns its new sequence number
    ///
    /// A replaced key gets a fresh sequence number and becomes the newest
    /// entry of its store. Writing into a missing store creates it.
    pub async fn put_entry(
        &self,
        store: &str,
        key: &str,
        snapshot: &ResponseSnapshot,
    ) -> Result<i64, DbError> {
        let headers = serde_json::to_string(&snapshot.headers)?;
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT OR IGNORE INTO stores (name, created_at) VALUES (?, ?)")
            .bind(store)
            .bind(Utc::now().to_rfc3339())
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM entries WHERE store = ? AND key = ?")
            .bind(store)
            .bind(key)
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query(
            r#"
            INSERT INTO entries (store, key, status, headers, body, captured_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING seq
            "#,
        )
        .bind(store)
        .bind(key)
        .bind(snapshot.status as i64)
        .bind(headers)
        .bind(snapshot.body.to_vec())
        .bind(snapshot.captured_at.to_rfc3339())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row.get("seq"))
    }

    /// Get an entry by key
    pub async fn get_entry(&self, store: &str, key: &str) -> Result<Option<EntryRecord>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT seq, store, key, status, headers, body, captured_at
            FROM entries
            WHERE store = ? AND key = ?
            "#,
        )
        .bind(store)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        result.map(|row| EntryRecord::try_from(&row)).transpose()
    }

    /// Delete an entry by key
    pub async fn delete_entry(&self, store: &str, key: &str) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM entries WHERE store = ? AND key = ?")
            .bind(store)
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete an entry only if it still has the given sequence number
    pub async fn delete_entry_if_seq(
        &self,
        store: &str,
        key: &str,
        seq: i64,
    ) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM entries WHERE store = ? AND key = ? AND seq = ?")
            .bind(store)
            .bind(key)
            .bind(seq)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Sequence numbers and keys of a store, oldest insertion first
    pub async fn list_sequenced_keys(&self, store: &str) -> Result<Vec<(i64, String)>, DbError> {
        let rows = sqlx::query("SELECT seq, key FROM entries WHERE store = ? ORDER BY seq ASC")
            .bind(store)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .iter()
            .map(|row| (row.get("seq"), row.get("key")))
            .collect())
    }

    /// Get entry count of a store
    pub async fn count_entries(&self, store: &str) -> Result<i64, DbError> {
        let result = sqlx::query("SELECT COUNT(*) as count FROM entries WHERE store = ?")
            .bind(store)
            .fetch_one(&self.pool)
            .await?;
        Ok(result.get("count"))
    }

    /// Remove every entry of a store, keeping the store itself
    pub async fn clear_entries(&self, store: &str) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM entries WHERE store = ?")
            .bind(store)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
