//! shellcache HTTP API
//!
//! This crate provides the Axum-based HTTP surface of shellcache: the
//! interception boundary every client request passes through, and the
//! management API under the reserved `/__shellcache/` prefix.

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{MANAGEMENT_PREFIX, create_router};
pub use state::{AppState, MetricsHandle};
