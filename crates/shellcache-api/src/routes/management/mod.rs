//! Management API routes
//!
//! Cache statistics, store inspection and the version lifecycle, all under
//! the reserved `/__shellcache/` prefix.

pub mod cache;
pub mod lifecycle;
pub mod types;

use axum::Router;

use crate::state::AppState;

/// Create management API routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(cache::routes())
        .merge(lifecycle::routes())
}
