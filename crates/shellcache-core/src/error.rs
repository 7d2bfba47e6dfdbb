//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] shellcache_storage::StorageError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] shellcache_fetch::FetchError),

    #[error("Install of version {version} failed: {}", .failed.join(", "))]
    InstallFailed { version: String, failed: Vec<String> },

    #[error("Invalid lifecycle transition: {0}")]
    InvalidState(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
