//! Storage error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Store not found: {0}")]
    StoreNotFound(String),

    #[error("Invalid store name: {0}")]
    InvalidStoreName(String),

    #[error("Quota exceeded in store {store}: {message}")]
    QuotaExceeded { store: String, message: String },

    #[error("Storage backend error: {0}")]
    Backend(String),
}
