//! Cache management routes

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use shellcache_storage::version_tag;
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;

use super::types::{CacheStatsResponse, StoreDetail, StoreSummary};

// ==================== Cache Routes ====================

/// GET /__shellcache/stats
async fn cache_stats(State(state): State<AppState>) -> Result<Json<CacheStatsResponse>, ApiError> {
    let storage = state.registration.storage();
    let names = storage.names().await?;

    let mut entry_count = 0;
    for name in &names {
        entry_count += storage.open(name).await?.len().await?;
    }

    let active = state.registration.active();
    let engine = match &active {
        Some(worker) => Some(worker.stats().await),
        None => None,
    };

    let hit_rate = match &engine {
        Some(stats) if stats.hit_count + stats.miss_count > 0 => {
            stats.hit_count as f64 / (stats.hit_count + stats.miss_count) as f64
        }
        _ => 0.0,
    };

    Ok(Json(CacheStatsResponse {
        version: active.map(|w| w.version().to_string()),
        store_count: names.len(),
        entry_count,
        hit_rate,
        engine,
    }))
}

/// GET /__shellcache/stores
async fn list_stores(State(state): State<AppState>) -> Result<Json<Vec<StoreSummary>>, ApiError> {
    let storage = state.registration.storage();
    let active = state.registration.active();

    let mut stores = Vec::new();
    for name in storage.names().await? {
        let entries = storage.open(&name).await?.len().await?;
        let current = active
            .as_ref()
            .map(|w| w.lifecycle().stores().contains(&name))
            .unwrap_or(false);

        stores.push(StoreSummary {
            version: version_tag(&name).map(str::to_string),
            name,
            entries,
            current,
        });
    }

    Ok(Json(stores))
}

/// GET /__shellcache/stores/{name}
async fn get_store(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<StoreDetail>, ApiError> {
    let storage = state.registration.storage();
    if !storage.has(&name).await? {
        return Err(ApiError::NotFound(format!("store {}", name)));
    }

    let store = storage.open(&name).await?;
    let keys = store.keys().await?;

    Ok(Json(StoreDetail {
        name,
        entries: keys.len() as u64,
        keys,
    }))
}

/// DELETE /__shellcache/stores/{name}
async fn delete_store(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !state.registration.storage().delete(&name).await? {
        return Err(ApiError::NotFound(format!("store {}", name)));
    }

    info!("Deleted store {} via management API", name);

    Ok(Json(serde_json::json!({
        "deleted": name
    })))
}

/// Create cache routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/__shellcache/stats", get(cache_stats))
        .route("/__shellcache/stores", get(list_stores))
        .route("/__shellcache/stores/{name}", get(get_store).delete(delete_store))
}
