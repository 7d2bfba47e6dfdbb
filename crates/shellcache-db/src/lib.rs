//! shellcache Database Layer
//!
//! This crate provides persistent cache storage for shellcache,
//! using SQLite via sqlx.

pub mod error;
pub mod models;
pub mod repository;
pub mod storage;
pub mod utils;

pub use error::DbError;
pub use models::{EntryRecord, StoreRecord};
pub use repository::Database;
pub use storage::{SqliteStorage, SqliteStore};
