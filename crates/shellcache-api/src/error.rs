//! API error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use shellcache_core::CoreError;
use shellcache_fetch::FetchError;
use shellcache_storage::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            ApiError::Fetch(e) => fetch_parts(e),
            ApiError::Core(e) => match e {
                CoreError::Fetch(inner) => fetch_parts(inner),
                CoreError::InstallFailed { .. } => {
                    (StatusCode::BAD_GATEWAY, "INSTALL_FAILED", e.to_string())
                }
                CoreError::InvalidConfig(msg) => {
                    (StatusCode::BAD_REQUEST, "INVALID_CONFIG", msg.clone())
                }
                CoreError::InvalidState(msg) => (StatusCode::CONFLICT, "INVALID_STATE", msg.clone()),
                CoreError::Storage(inner) => storage_parts(inner),
            },
            ApiError::Storage(e) => storage_parts(e),
        }
    }
}

/// Network failures with no cached fallback
fn fetch_parts(e: &FetchError) -> (StatusCode, &'static str, String) {
    if e.is_timeout() {
        (StatusCode::GATEWAY_TIMEOUT, "NETWORK_TIMEOUT", e.to_string())
    } else {
        (StatusCode::BAD_GATEWAY, "NETWORK_ERROR", e.to_string())
    }
}

fn storage_parts(e: &StorageError) -> (StatusCode, &'static str, String) {
    match e {
        StorageError::StoreNotFound(name) => (StatusCode::NOT_FOUND, "NOT_FOUND", name.clone()),
        StorageError::InvalidStoreName(msg) => {
            (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone())
        }
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "STORAGE_ERROR",
            e.to_string(),
        ),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        let body = axum::Json(json!({
            "error": {
                "code": code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}
