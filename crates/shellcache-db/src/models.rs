//! Database models

use crate::error::DbError;
use crate::utils::parse_datetime_or_now;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shellcache_storage::ResponseSnapshot;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

/// Named store model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreRecord {
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<&SqliteRow> for StoreRecord {
    type Error = sqlx::Error;

    fn try_from(row: &SqliteRow) -> Result<Self, Self::Error> {
        let created_at: String = row.try_get("created_at")?;
        Ok(Self {
            name: row.try_get("name")?,
            created_at: parse_datetime_or_now(&created_at),
        })
    }
}

/// Cached response model
///
/// `seq` grows with every write, so ordering by it gives insertion order.
#[derive(Debug, Clone)]
pub struct EntryRecord {
    pub seq: i64,
    pub store: String,
    pub key: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub captured_at: DateTime<Utc>,
}

impl TryFrom<&SqliteRow> for EntryRecord {
    type Error = DbError;

    fn try_from(row: &SqliteRow) -> Result<Self, Self::Error> {
        let status: i64 = row.try_get("status")?;
        let headers: String = row.try_get("headers")?;
        let captured_at: String = row.try_get("captured_at")?;

        Ok(Self {
            seq: row.try_get("seq")?,
            store: row.try_get("store")?,
            key: row.try_get("key")?,
            status: u16::try_from(status)
                .map_err(|_| DbError::Corrupt(format!("status out of range: {}", status)))?,
            headers: serde_json::from_str(&headers)?,
            body: row.try_get("body")?,
            captured_at: parse_datetime_or_now(&captured_at),
        })
    }
}

impl From<EntryRecord> for ResponseSnapshot {
    fn from(record: EntryRecord) -> Self {
        ResponseSnapshot {
            status: record.status,
            headers: record.headers,
            body: Bytes::from(record.body),
            captured_at: record.captured_at,
        }
    }
}
