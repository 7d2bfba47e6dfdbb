//! Interception boundary
//!
//! Every request outside the management prefix lands here. GETs go through
//! the active cache version; anything else is forwarded untouched.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri},
    response::Response,
};
use bytes::Bytes;
use shellcache_core::{CacheRequest, Handled, ServedFrom};
use shellcache_storage::ResponseSnapshot;
use tracing::{debug, warn};
use url::Url;

use super::MANAGEMENT_PREFIX;
use crate::error::ApiError;
use crate::state::AppState;

pub async fn intercept(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    if uri.path() == MANAGEMENT_PREFIX || uri.path().starts_with("/__shellcache/") {
        return Err(ApiError::NotFound(uri.path().to_string()));
    }

    let url = resolve_url(state.registration.origin(), &uri)?;

    if method != Method::GET {
        debug!("Forwarding {} {}", method, url);
        let response = state.fetcher.forward(method, &url, &headers, body).await?;
        return Ok(into_response(response, None));
    }

    let request = CacheRequest::new(url, headers);
    let handled = state.registration.handle(&request).await?;
    Ok(into_response(handled.response.clone(), Some(&handled)))
}

/// Absolute-form URIs address a third party directly; origin-form ones
/// are resolved against the application origin
fn resolve_url(origin: &Url, uri: &Uri) -> Result<Url, ApiError> {
    if uri.scheme().is_some() {
        return Url::parse(&uri.to_string())
            .map_err(|e| ApiError::BadRequest(format!("{}: {}", uri, e)));
    }

    let path_and_query = uri.path_and_query().map(|p| p.as_str()).unwrap_or("/");
    origin
        .join(path_and_query)
        .map_err(|e| ApiError::BadRequest(format!("{}: {}", path_and_query, e)))
}

fn into_response(snapshot: ResponseSnapshot, handled: Option<&Handled>) -> Response {
    let status = StatusCode::from_u16(snapshot.status).unwrap_or(StatusCode::BAD_GATEWAY);

    let mut response = Response::new(Body::from(snapshot.body));
    *response.status_mut() = status;

    let headers = response.headers_mut();
    for (name, value) in &snapshot.headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.append(name, value);
            }
            _ => warn!("Dropping unrepresentable header {}", name),
        }
    }

    let from = handled.map(|h| h.from).unwrap_or(ServedFrom::Passthrough);
    headers.insert(
        "x-shellcache-source",
        HeaderValue::from_static(from.as_str()),
    );
    if let Some((class, strategy)) = handled.and_then(|h| h.route) {
        headers.insert("x-shellcache-class", HeaderValue::from_static(class.as_str()));
        headers.insert(
            "x-shellcache-strategy",
            HeaderValue::from_static(strategy.as_str()),
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        Url::parse("http://app.local:3000").unwrap()
    }

    #[test]
    fn test_resolve_origin_form() {
        let uri: Uri = "/api/tools?category=2".parse().unwrap();
        assert_eq!(
            resolve_url(&origin(), &uri).unwrap().as_str(),
            "http://app.local:3000/api/tools?category=2"
        );
    }

    #[test]
    fn test_resolve_absolute_form() {
        let uri: Uri = "http://fonts.example/inter.woff2".parse().unwrap();
        assert_eq!(
            resolve_url(&origin(), &uri).unwrap().as_str(),
            "http://fonts.example/inter.woff2"
        );
    }

    #[test]
    fn test_response_carries_snapshot_headers() {
        let snapshot = ResponseSnapshot::new(
            404,
            vec![("content-type".to_string(), "text/plain".to_string())],
            "missing",
        );
        let response = into_response(snapshot, None);

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()["content-type"], "text/plain");
        assert_eq!(response.headers()["x-shellcache-source"], "passthrough");
        assert!(response.headers().get("x-shellcache-class").is_none());
    }
}
