//! Request/Response DTOs for management API

use serde::Serialize;
use shellcache_core::{EngineStats, LifecycleState, RegisterOutcome};

// ==================== Cache Types ====================

/// Cache statistics response
#[derive(Serialize)]
pub struct CacheStatsResponse {
    pub version: Option<String>,
    pub store_count: usize,
    pub entry_count: u64,
    pub hit_rate: f64,
    /// Counters of the active version; absent when nothing is active
    pub engine: Option<EngineStats>,
}

/// Summary of one store
#[derive(Serialize)]
pub struct StoreSummary {
    pub name: String,
    pub version: Option<String>,
    pub entries: u64,
    /// Whether the store belongs to the active version
    pub current: bool,
}

/// One store with its keys, oldest first
#[derive(Serialize)]
pub struct StoreDetail {
    pub name: String,
    pub entries: u64,
    pub keys: Vec<String>,
}

// ==================== Lifecycle Types ====================

/// Strategy binding of one request class
#[derive(Serialize)]
pub struct BindingResponse {
    pub class: String,
    pub strategy: String,
    pub store: String,
    pub max_entries: Option<u64>,
}

/// Active version and its bindings
#[derive(Serialize)]
pub struct LifecycleResponse {
    pub version: Option<String>,
    pub state: LifecycleState,
    pub bindings: Vec<BindingResponse>,
}

/// Result of a manual update
#[derive(Serialize)]
pub struct UpdateResponse {
    #[serde(flatten)]
    pub outcome: RegisterOutcome,
}
