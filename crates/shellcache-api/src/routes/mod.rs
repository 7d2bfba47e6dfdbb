//! API routes

mod health;
mod intercept;
mod management;
pub mod metrics;

use axum::{Router, extract::DefaultBodyLimit};
use std::sync::Arc;

use crate::state::{AppState, MetricsHandle};

/// Path prefix reserved for shellcache's own endpoints; never intercepted
pub const MANAGEMENT_PREFIX: &str = "/__shellcache";

/// Create the main router
pub fn create_router(state: AppState, metrics_handle: Option<Arc<MetricsHandle>>) -> Router {
    let mut router = Router::new()
        .merge(health::routes())
        .merge(management::routes())
        // Everything else is a client request
        .fallback(intercept::intercept)
        .with_state(state)
        .layer(DefaultBodyLimit::max(32 * 1024 * 1024));

    // Add metrics endpoint if handle is provided
    if let Some(handle) = metrics_handle {
        router = router.merge(metrics::routes(handle));
    }

    router
}
