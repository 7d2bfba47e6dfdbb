//! shellcache Storage Layer
//!
//! This crate provides the cache store abstraction for shellcache:
//! named, insertion-ordered key to response mappings, plus an
//! in-memory backend.

pub mod backend;
pub mod error;
pub mod memory;
pub mod snapshot;

pub use backend::{CacheStorage, CacheStore, parse_store_name, version_tag};
pub use error::StorageError;
pub use memory::{MemoryStorage, MemoryStore};
pub use snapshot::ResponseSnapshot;
