//! Store operations

use chrono::Utc;
use sqlx::Row;

use crate::error::DbError;
use crate::models::StoreRecord;
use crate::repository::Database;

impl Database {
    // ==================== Store Operations ====================

    /// Create a store row if it does not exist yet
    pub async fn ensure_store(&self, name: &str) -> Result<(), DbError> {
        sqlx::query("INSERT OR IGNORE INTO stores (name, created_at) VALUES (?, ?)")
            .bind(name)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Check whether a store exists
    pub async fn store_exists(&self, name: &str) -> Result<bool, DbError> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM stores WHERE name = ?")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        let count: i64 = row.get("count");
        Ok(count > 0)
    }

    /// List all stores, sorted by name
    pub async fn list_stores(&self) -> Result<Vec<StoreRecord>, DbError> {
        let rows = sqlx::query("SELECT name, created_at FROM stores ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| StoreRecord::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// Drop a store and all of its entries
    pub async fn drop_store(&self, name: &str) -> Result<bool, DbError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM entries WHERE store = ?")
            .bind(name)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM stores WHERE name = ?")
            .bind(name)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}
