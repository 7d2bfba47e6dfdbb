//! Origin client

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, Method};
use reqwest::{Client, Response};
use shellcache_storage::ResponseSnapshot;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::error::FetchError;

/// Headers that describe a single connection and are never forwarded or stored
const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "host",
    "content-length",
];

/// The network, as seen by the caching layer
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// GET a resource
    async fn fetch(&self, url: &Url, headers: &HeaderMap) -> Result<ResponseSnapshot, FetchError>;

    /// Forward any request unchanged; the result is never cached
    async fn forward(
        &self,
        method: Method,
        url: &Url,
        headers: &HeaderMap,
        body: Bytes,
    ) -> Result<ResponseSnapshot, FetchError>;
}

/// Origin client configuration
#[derive(Clone, Debug)]
pub struct OriginClientConfig {
    /// Base URL of the application origin
    pub url: String,
    /// Skip TLS certificate verification
    pub skip_tls_verify: bool,
    /// Whole-request timeout; `None` waits as long as the transport does
    pub timeout: Option<Duration>,
}

/// HTTP client for the application origin
pub struct OriginClient {
    base: Url,
    client: Client,
}

impl OriginClient {
    /// Create a new origin client
    pub fn new(config: OriginClientConfig) -> Result<Self, FetchError> {
        let base = Url::parse(&config.url)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", config.url, e)))?;

        let mut builder = Client::builder();

        if config.skip_tls_verify {
            builder = builder.danger_accept_invalid_certs(true);
        }

        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build()?;

        info!(
            "Created origin client for {} (timeout: {})",
            base,
            config
                .timeout
                .map(|t| format!("{}s", t.as_secs()))
                .unwrap_or_else(|| "none".to_string())
        );

        Ok(Self { base, client })
    }

    /// Base URL of the origin
    pub fn base(&self) -> &Url {
        &self.base
    }

    async fn into_snapshot(response: Response) -> Result<ResponseSnapshot, FetchError> {
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter(|(name, _)| !is_hop_by_hop(name.as_str()))
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        let body = response.bytes().await.map_err(FetchError::from_send)?;

        Ok(ResponseSnapshot::new(status, headers, body))
    }
}

#[async_trait]
impl Fetcher for OriginClient {
    async fn fetch(&self, url: &Url, headers: &HeaderMap) -> Result<ResponseSnapshot, FetchError> {
        debug!("Fetching {}", url);

        let response = self
            .client
            .get(url.clone())
            .headers(forwardable(headers))
            .send()
            .await
            .map_err(FetchError::from_send)?;

        debug!("Fetched {} -> {}", url, response.status());
        Self::into_snapshot(response).await
    }

    async fn forward(
        &self,
        method: Method,
        url: &Url,
        headers: &HeaderMap,
        body: Bytes,
    ) -> Result<ResponseSnapshot, FetchError> {
        debug!("Forwarding {} {}", method, url);

        let response = self
            .client
            .request(method, url.clone())
            .headers(forwardable(headers))
            .body(body)
            .send()
            .await
            .map_err(FetchError::from_send)?;

        Self::into_snapshot(response).await
    }
}

fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP_HEADERS
        .iter()
        .any(|h| h.eq_ignore_ascii_case(name))
}

/// Copy of the request headers without connection-scoped ones
fn forwardable(headers: &HeaderMap) -> HeaderMap {
    headers
        .iter()
        .filter(|(name, _)| !is_hop_by_hop(name.as_str()))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}
