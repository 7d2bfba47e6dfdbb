//! Version lifecycle routes

use axum::{Json, Router, extract::State, routing::{get, post}};
use shellcache_core::{LifecycleState, RequestClass};
use tracing::{info, warn};

use crate::error::ApiError;
use crate::state::AppState;

use super::types::{BindingResponse, LifecycleResponse, UpdateResponse};

/// GET /__shellcache/lifecycle
async fn get_lifecycle(State(state): State<AppState>) -> Json<LifecycleResponse> {
    let Some(worker) = state.registration.active() else {
        return Json(LifecycleResponse {
            version: None,
            state: LifecycleState::Unregistered,
            bindings: Vec::new(),
        });
    };

    let bindings = [RequestClass::StaticShell, RequestClass::Api, RequestClass::Other]
        .into_iter()
        .map(|class| {
            let binding = worker.bindings().get(class);
            BindingResponse {
                class: class.to_string(),
                strategy: binding.strategy.to_string(),
                store: binding.store.clone(),
                max_entries: binding.max_entries,
            }
        })
        .collect();

    Json(LifecycleResponse {
        version: Some(worker.version().to_string()),
        state: worker.lifecycle().state(),
        bindings,
    })
}

/// POST /__shellcache/lifecycle/update
///
/// Re-reads the settings and installs the version they describe.
async fn update(State(state): State<AppState>) -> Result<Json<UpdateResponse>, ApiError> {
    if let Err(e) = state.settings.reload() {
        warn!("Failed to reload settings, using current ones: {}", e);
    }

    let settings = state.settings.get_cache_settings();
    info!("Manual update to version {} requested", settings.version);

    let outcome = state.registration.register(&settings).await?;
    Ok(Json(UpdateResponse { outcome }))
}

/// Create lifecycle routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/__shellcache/lifecycle", get(get_lifecycle))
        .route("/__shellcache/lifecycle/update", post(update))
}
