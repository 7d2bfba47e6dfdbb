//! Strategy execution against a cache store and the network

use serde::Serialize;
use shellcache_fetch::{FetchError, Fetcher};
use shellcache_storage::{CacheStorage, CacheStore, ResponseSnapshot};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::policy::{Strategy, WritePolicy};
use super::sequence::WriteSequencer;
use crate::error::CoreError;
use crate::eviction::enforce_limit;
use crate::request::CacheRequest;

/// Where a response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServedFrom {
    Cache,
    Network,
    /// No active version; the request went to the network untouched
    Passthrough,
}

impl ServedFrom {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServedFrom::Cache => "cache",
            ServedFrom::Network => "network",
            ServedFrom::Passthrough => "passthrough",
        }
    }
}

/// A response handed back to the caller
#[derive(Debug, Clone)]
pub struct Served {
    pub response: ResponseSnapshot,
    pub from: ServedFrom,
}

/// Target of a strategy: the store it reads and writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub strategy: Strategy,
    pub store: String,
    /// Entry ceiling enforced after every write; `None` leaves the store unbounded
    pub max_entries: Option<u64>,
}

/// Engine statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct EngineStats {
    pub hit_count: u64,
    pub miss_count: u64,
    pub network_errors: u64,
    pub revalidations: u64,
    pub revalidate_failures: u64,
    pub superseded_writes: u64,
    pub skipped_writes: u64,
    pub store_errors: u64,
}

/// Runs the three caching strategies
///
/// Cloning is cheap; clones share storage, network and statistics.
#[derive(Clone)]
pub struct StrategyEngine {
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    write_policy: WritePolicy,
    sequencer: Option<Arc<WriteSequencer>>,
    stats: Arc<RwLock<EngineStats>>,
}

impl StrategyEngine {
    pub fn new(
        storage: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
        write_policy: WritePolicy,
        ordered_revalidation: bool,
    ) -> Self {
        Self {
            storage,
            fetcher,
            write_policy,
            sequencer: ordered_revalidation.then(|| Arc::new(WriteSequencer::new())),
            stats: Arc::new(RwLock::new(EngineStats::default())),
        }
    }

    /// Get engine statistics
    pub async fn stats(&self) -> EngineStats {
        self.stats.read().await.clone()
    }

    /// Answer `request` with the strategy and store named by `binding`
    ///
    /// Stores are only created by a write; a read against a store that does
    /// not exist yet is a miss.
    pub async fn execute(
        &self,
        request: &CacheRequest,
        binding: &Binding,
    ) -> Result<Served, CoreError> {
        match binding.strategy {
            Strategy::CacheFirst => self.cache_first(request, binding).await,
            Strategy::NetworkFirst => self.network_first(request, binding).await,
            Strategy::StaleWhileRevalidate => self.stale_while_revalidate(request, binding).await,
        }
    }

    async fn cache_first(
        &self,
        request: &CacheRequest,
        binding: &Binding,
    ) -> Result<Served, CoreError> {
        let key = request.key();

        if let Some(cached) = self.lookup(&binding.store, &key).await {
            return Ok(Served {
                response: cached,
                from: ServedFrom::Cache,
            });
        }

        // App shell assets should have been installed; a failure here is surfaced
        let response = self.fetch(request).await?;
        self.store_response(binding, &key, &response).await;

        Ok(Served {
            response,
            from: ServedFrom::Network,
        })
    }

    async fn network_first(
        &self,
        request: &CacheRequest,
        binding: &Binding,
    ) -> Result<Served, CoreError> {
        let key = request.key();

        match self.fetch(request).await {
            Ok(response) => {
                self.store_response(binding, &key, &response).await;
                Ok(Served {
                    response,
                    from: ServedFrom::Network,
                })
            }
            Err(e) => match self.lookup(&binding.store, &key).await {
                Some(cached) => {
                    debug!("Network failed for {}, serving cached copy: {}", key, e);
                    Ok(Served {
                        response: cached,
                        from: ServedFrom::Cache,
                    })
                }
                None => Err(CoreError::Fetch(e)),
            },
        }
    }

    async fn stale_while_revalidate(
        &self,
        request: &CacheRequest,
        binding: &Binding,
    ) -> Result<Served, CoreError> {
        let key = request.key();
        let cached = self.lookup(&binding.store, &key).await;
        let ticket = self.sequencer.as_ref().map(|s| s.issue());

        if let Some(cached) = cached {
            let engine = self.clone();
            let request = request.clone();
            let binding = binding.clone();
            tokio::spawn(async move {
                engine.revalidate(request, binding, ticket).await;
            });

            return Ok(Served {
                response: cached,
                from: ServedFrom::Cache,
            });
        }

        let response = self.fetch(request).await?;
        self.write_ordered(binding, &key, &response, ticket).await;

        Ok(Served {
            response,
            from: ServedFrom::Network,
        })
    }

    /// Background refresh; the caller already has its answer, so failures stop here
    async fn revalidate(&self, request: CacheRequest, binding: Binding, ticket: Option<u64>) {
        self.stats.write().await.revalidations += 1;
        let key = request.key();

        match self.fetch(&request).await {
            Ok(response) => {
                self.write_ordered(&binding, &key, &response, ticket).await;
            }
            Err(e) => {
                debug!("Background refresh of {} failed: {}", key, e);
                self.stats.write().await.revalidate_failures += 1;
                metrics::counter!("shellcache_revalidate_failures_total").increment(1);
            }
        }
    }

    async fn write_ordered(
        &self,
        binding: &Binding,
        key: &str,
        response: &ResponseSnapshot,
        ticket: Option<u64>,
    ) {
        match (&self.sequencer, ticket) {
            (Some(sequencer), Some(ticket)) => {
                let written = sequencer
                    .commit(key, ticket, || self.store_response(binding, key, response))
                    .await;
                if !written {
                    debug!("Dropping superseded refresh of {}", key);
                    self.stats.write().await.superseded_writes += 1;
                }
            }
            _ => self.store_response(binding, key, response).await,
        }
    }

    async fn open_store(&self, name: &str) -> Option<Arc<dyn CacheStore>> {
        match self.storage.open(name).await {
            Ok(store) => Some(store),
            Err(e) => {
                warn!("Failed to open store {}: {}", name, e);
                self.record_store_error().await;
                None
            }
        }
    }

    /// Open a store for reading without creating it
    async fn existing_store(&self, name: &str) -> Option<Arc<dyn CacheStore>> {
        match self.storage.has(name).await {
            Ok(true) => self.open_store(name).await,
            Ok(false) => None,
            Err(e) => {
                warn!("Failed to look up store {}: {}", name, e);
                self.record_store_error().await;
                None
            }
        }
    }

    /// Read a key; a missing store or a store error counts as a miss
    async fn lookup(&self, store_name: &str, key: &str) -> Option<ResponseSnapshot> {
        let found = match self.existing_store(store_name).await {
            Some(store) => match store.get(key).await {
                Ok(found) => found,
                Err(e) => {
                    warn!("Cache read of {} from {} failed: {}", key, store_name, e);
                    self.record_store_error().await;
                    None
                }
            },
            None => None,
        };

        let mut stats = self.stats.write().await;
        if found.is_some() {
            debug!("Cache hit in {}: {}", store_name, key);
            stats.hit_count += 1;
            metrics::counter!("shellcache_cache_hits_total", "store" => store_name.to_string())
                .increment(1);
        } else {
            debug!("Cache miss in {}: {}", store_name, key);
            stats.miss_count += 1;
            metrics::counter!("shellcache_cache_misses_total", "store" => store_name.to_string())
                .increment(1);
        }

        found
    }

    /// Fetch the full resource, without the client's conditional or range headers
    async fn fetch(&self, request: &CacheRequest) -> Result<ResponseSnapshot, FetchError> {
        match self
            .fetcher
            .fetch(&request.url, &request.network_headers())
            .await
        {
            Ok(response) => Ok(response),
            Err(e) => {
                self.stats.write().await.network_errors += 1;
                metrics::counter!("shellcache_network_errors_total").increment(1);
                Err(e)
            }
        }
    }

    /// Write-through step shared by all strategies
    ///
    /// A failed write is dropped and skips eviction; the caller still gets
    /// the network response.
    async fn store_response(&self, binding: &Binding, key: &str, response: &ResponseSnapshot) {
        if !self.write_policy.should_store(response) {
            debug!(
                "Not caching {} (status {}, policy {})",
                key,
                response.status,
                self.write_policy.as_str()
            );
            self.stats.write().await.skipped_writes += 1;
            return;
        }

        let Some(store) = self.open_store(&binding.store).await else {
            return;
        };

        if let Err(e) = store.put(key, response.clone()).await {
            warn!("Cache write of {} to {} failed: {}", key, store.name(), e);
            self.record_store_error().await;
            metrics::counter!("shellcache_store_write_errors_total").increment(1);
            return;
        }

        if let Some(max_entries) = binding.max_entries {
            if let Err(e) = enforce_limit(store.as_ref(), max_entries).await {
                warn!("Eviction in {} failed: {}", store.name(), e);
                self.record_store_error().await;
            }
        }
    }

    async fn record_store_error(&self) {
        self.stats.write().await.store_errors += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedFetcher, eventually, request, request_with};
    use async_trait::async_trait;
    use shellcache_storage::{MemoryStorage, StorageError};
    use std::time::Duration;

    struct Harness {
        storage: Arc<MemoryStorage>,
        fetcher: Arc<ScriptedFetcher>,
        engine: StrategyEngine,
    }

    fn harness_with(write_policy: WritePolicy, ordered: bool) -> Harness {
        let storage = Arc::new(MemoryStorage::new());
        let fetcher = Arc::new(ScriptedFetcher::new());
        let engine = StrategyEngine::new(storage.clone(), fetcher.clone(), write_policy, ordered);
        Harness {
            storage,
            fetcher,
            engine,
        }
    }

    fn harness() -> Harness {
        harness_with(WritePolicy::All, false)
    }

    fn binding(strategy: Strategy, store: &str, max_entries: Option<u64>) -> Binding {
        Binding {
            strategy,
            store: store.to_string(),
            max_entries,
        }
    }

    async fn seed(h: &Harness, store: &str, url: &str, body: &str) {
        h.storage
            .open(store)
            .await
            .unwrap()
            .put(url, ResponseSnapshot::new(200, vec![], body.to_string()))
            .await
            .unwrap();
    }

    async fn stored_body(h: &Harness, store: &str, url: &str) -> Option<String> {
        h.storage
            .open(store)
            .await
            .unwrap()
            .get(url)
            .await
            .unwrap()
            .map(|s| String::from_utf8_lossy(&s.body).to_string())
    }

    // ==================== Cache-First ====================

    #[tokio::test]
    async fn test_cache_first_hit_makes_no_network_call() {
        let h = harness();
        let url = "http://app.local/static/js/main.js";
        seed(&h, "static-v1", url, "cached").await;
        h.fetcher.respond(url, 200, "fresh");

        let b = binding(Strategy::CacheFirst, "static-v1", None);
        let served = h.engine.execute(&request(url), &b).await.unwrap();

        assert_eq!(served.from, ServedFrom::Cache);
        assert_eq!(served.response.body.as_ref(), b"cached");
        assert_eq!(h.fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_cache_first_miss_fetches_and_stores() {
        let h = harness();
        let url = "http://app.local/manifest.json";
        h.fetcher.respond(url, 200, "{}");

        let b = binding(Strategy::CacheFirst, "static-v1", None);
        let served = h.engine.execute(&request(url), &b).await.unwrap();

        assert_eq!(served.from, ServedFrom::Network);
        assert_eq!(served.response.body.as_ref(), b"{}");
        assert_eq!(stored_body(&h, "static-v1", url).await.as_deref(), Some("{}"));
    }

    #[tokio::test]
    async fn test_cache_first_miss_with_network_failure_propagates() {
        let h = harness();
        let url = "http://app.local/static/css/main.css";
        h.fetcher.fail(url);

        let b = binding(Strategy::CacheFirst, "static-v1", None);
        let result = h.engine.execute(&request(url), &b).await;

        assert!(matches!(result, Err(CoreError::Fetch(_))));
        // A miss never creates the store
        assert!(!h.storage.has("static-v1").await.unwrap());
    }

    // ==================== Network-First ====================

    #[tokio::test]
    async fn test_network_first_prefers_network_and_stores() {
        let h = harness();
        let url = "http://app.local/img/a.png";
        seed(&h, "dynamic-v1", url, "old").await;
        h.fetcher.respond(url, 200, "new");

        let b = binding(Strategy::NetworkFirst, "dynamic-v1", Some(50));
        let served = h.engine.execute(&request(url), &b).await.unwrap();

        assert_eq!(served.from, ServedFrom::Network);
        assert_eq!(served.response.body.as_ref(), b"new");
        assert_eq!(stored_body(&h, "dynamic-v1", url).await.as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_network_first_falls_back_to_cache() {
        let h = harness();
        let url = "http://app.local/img/a.png";
        seed(&h, "dynamic-v1", url, "old").await;
        h.fetcher.fail(url);

        let b = binding(Strategy::NetworkFirst, "dynamic-v1", Some(50));
        let served = h.engine.execute(&request(url), &b).await.unwrap();

        assert_eq!(served.from, ServedFrom::Cache);
        assert_eq!(served.response.body.as_ref(), b"old");
    }

    #[tokio::test]
    async fn test_network_first_unseen_path_offline_fails_without_write() {
        let h = harness();
        let url = "http://app.local/api/tools/404";
        h.fetcher.fail(url);

        let b = binding(Strategy::NetworkFirst, "dynamic-v1", Some(50));
        let result = h.engine.execute(&request(url), &b).await;

        assert!(matches!(result, Err(CoreError::Fetch(_))));
        assert!(!h.storage.has("dynamic-v1").await.unwrap());
    }

    #[tokio::test]
    async fn test_http_error_status_is_a_response_not_a_failure() {
        let h = harness();
        let url = "http://app.local/img/missing.png";
        seed(&h, "dynamic-v1", url, "old").await;
        h.fetcher.respond(url, 404, "not found");

        let b = binding(Strategy::NetworkFirst, "dynamic-v1", Some(50));
        let served = h.engine.execute(&request(url), &b).await.unwrap();

        assert_eq!(served.from, ServedFrom::Network);
        assert_eq!(served.response.status, 404);
        // Default policy stores responses as-is
        assert_eq!(
            stored_body(&h, "dynamic-v1", url).await.as_deref(),
            Some("not found")
        );
    }

    #[tokio::test]
    async fn test_success_only_policy_skips_error_responses() {
        let h = harness_with(WritePolicy::SuccessOnly, false);
        let url = "http://app.local/img/missing.png";
        seed(&h, "dynamic-v1", url, "old").await;
        h.fetcher.respond(url, 500, "boom");

        let b = binding(Strategy::NetworkFirst, "dynamic-v1", Some(50));
        let served = h.engine.execute(&request(url), &b).await.unwrap();

        assert_eq!(served.response.status, 500);
        assert_eq!(stored_body(&h, "dynamic-v1", url).await.as_deref(), Some("old"));
        assert_eq!(h.engine.stats().await.skipped_writes, 1);
    }

    #[tokio::test]
    async fn test_network_first_write_triggers_eviction() {
        let h = harness();
        for i in 0..50 {
            seed(&h, "dynamic-v1", &format!("http://app.local/img/{}.png", i), "x").await;
        }
        let url = "http://app.local/img/new.png";
        h.fetcher.respond(url, 200, "y");

        let b = binding(Strategy::NetworkFirst, "dynamic-v1", Some(50));
        h.engine.execute(&request(url), &b).await.unwrap();

        let store = h.storage.open("dynamic-v1").await.unwrap();
        assert_eq!(store.len().await.unwrap(), 50);
        assert!(store.get(url).await.unwrap().is_some());
        assert!(store.get("http://app.local/img/0.png").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_same_response_written_twice_keeps_count() {
        let h = harness();
        let url = "http://app.local/img/a.png";
        h.fetcher.respond(url, 200, "same");

        let b = binding(Strategy::NetworkFirst, "dynamic-v1", Some(50));
        h.engine.execute(&request(url), &b).await.unwrap();
        h.engine.execute(&request(url), &b).await.unwrap();

        let store = h.storage.open("dynamic-v1").await.unwrap();
        assert_eq!(store.len().await.unwrap(), 1);
        assert_eq!(stored_body(&h, "dynamic-v1", url).await.as_deref(), Some("same"));
    }

    // ==================== Stale-While-Revalidate ====================

    #[tokio::test]
    async fn test_swr_returns_cached_without_waiting_for_network() {
        let h = harness();
        let url = "http://app.local/api/categories";
        seed(&h, "api-v1", url, "stale").await;
        let gate = h.fetcher.gate(url, 200, "fresh");

        let b = binding(Strategy::StaleWhileRevalidate, "api-v1", None);
        let served = tokio::time::timeout(
            Duration::from_secs(1),
            h.engine.execute(&request(url), &b),
        )
        .await
        .expect("stale response must not wait for the network")
        .unwrap();

        assert_eq!(served.from, ServedFrom::Cache);
        assert_eq!(served.response.body.as_ref(), b"stale");

        gate.notify_one();
        eventually(|| async { stored_body(&h, "api-v1", url).await.as_deref() == Some("fresh") })
            .await;
    }

    #[tokio::test]
    async fn test_swr_miss_waits_for_network_and_stores() {
        let h = harness();
        let url = "http://app.local/api/tools";
        h.fetcher.respond(url, 200, "[]");

        let b = binding(Strategy::StaleWhileRevalidate, "api-v1", None);
        let served = h.engine.execute(&request(url), &b).await.unwrap();

        assert_eq!(served.from, ServedFrom::Network);
        assert_eq!(stored_body(&h, "api-v1", url).await.as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn test_swr_background_failure_is_swallowed() {
        let h = harness();
        let url = "http://app.local/api/tools/3";
        seed(&h, "api-v1", url, "stale").await;
        h.fetcher.fail(url);

        let b = binding(Strategy::StaleWhileRevalidate, "api-v1", None);
        let served = h.engine.execute(&request(url), &b).await.unwrap();
        assert_eq!(served.response.body.as_ref(), b"stale");

        let engine = h.engine.clone();
        eventually(|| {
            let engine = engine.clone();
            async move { engine.stats().await.revalidate_failures == 1 }
        })
        .await;
        assert_eq!(stored_body(&h, "api-v1", url).await.as_deref(), Some("stale"));
    }

    #[tokio::test]
    async fn test_swr_miss_with_network_failure_propagates() {
        let h = harness();
        let url = "http://app.local/api/tools/9";
        h.fetcher.fail(url);

        let b = binding(Strategy::StaleWhileRevalidate, "api-v1", None);
        let result = h.engine.execute(&request(url), &b).await;
        assert!(matches!(result, Err(CoreError::Fetch(_))));
    }

    #[tokio::test]
    async fn test_swr_concurrent_refreshes_last_completed_wins() {
        let h = harness();
        let url = "http://app.local/api/categories";
        seed(&h, "api-v1", url, "v0").await;
        let first = h.fetcher.gate(url, 200, "a");
        let second = h.fetcher.gate(url, 200, "b");

        // Refreshes are issued one at a time so each picks up its own gate
        let b = binding(Strategy::StaleWhileRevalidate, "api-v1", None);
        h.engine.execute(&request(url), &b).await.unwrap();
        eventually(|| async { h.fetcher.calls() == 1 }).await;
        h.engine.execute(&request(url), &b).await.unwrap();
        eventually(|| async { h.fetcher.calls() == 2 }).await;

        second.notify_one();
        eventually(|| async { stored_body(&h, "api-v1", url).await.as_deref() == Some("b") })
            .await;

        // The older fetch completes last and overwrites
        first.notify_one();
        eventually(|| async { stored_body(&h, "api-v1", url).await.as_deref() == Some("a") })
            .await;
    }

    #[tokio::test]
    async fn test_ordered_revalidation_drops_superseded_refresh() {
        let h = harness_with(WritePolicy::All, true);
        let url = "http://app.local/api/categories";
        seed(&h, "api-v1", url, "v0").await;
        let first = h.fetcher.gate(url, 200, "a");
        let second = h.fetcher.gate(url, 200, "b");

        // Refreshes are issued one at a time so each picks up its own gate
        let b = binding(Strategy::StaleWhileRevalidate, "api-v1", None);
        h.engine.execute(&request(url), &b).await.unwrap();
        eventually(|| async { h.fetcher.calls() == 1 }).await;
        h.engine.execute(&request(url), &b).await.unwrap();
        eventually(|| async { h.fetcher.calls() == 2 }).await;

        second.notify_one();
        eventually(|| async { stored_body(&h, "api-v1", url).await.as_deref() == Some("b") })
            .await;

        first.notify_one();
        let engine = h.engine.clone();
        eventually(|| {
            let engine = engine.clone();
            async move { engine.stats().await.superseded_writes == 1 }
        })
        .await;
        assert_eq!(stored_body(&h, "api-v1", url).await.as_deref(), Some("b"));
    }

    // ==================== Conditional and partial requests ====================

    #[tokio::test]
    async fn test_conditional_request_stores_full_resource() {
        let h = harness();
        let url = "http://app.local/api/tools";
        h.fetcher.respond_conditionally(url, "[1,2]", 304, "");

        let b = binding(Strategy::NetworkFirst, "api-v1", None);
        h.engine.execute(&request(url), &b).await.unwrap();

        let conditional = request_with(url, &[("if-none-match", "\"v1\"")]);
        let served = h.engine.execute(&conditional, &b).await.unwrap();
        assert_eq!(served.response.status, 200);
        assert_eq!(served.response.body.as_ref(), b"[1,2]");
        assert!(
            h.fetcher
                .sent_headers()
                .iter()
                .all(|headers| !headers.contains_key("if-none-match"))
        );

        // Offline, a plain GET still gets the full body
        h.fetcher.forget(url);
        h.fetcher.fail(url);
        let served = h.engine.execute(&request(url), &b).await.unwrap();
        assert_eq!(served.from, ServedFrom::Cache);
        assert_eq!(served.response.status, 200);
        assert_eq!(served.response.body.as_ref(), b"[1,2]");
    }

    #[tokio::test]
    async fn test_range_request_stores_full_resource() {
        let h = harness();
        let url = "http://app.local/api/categories";
        h.fetcher.respond_conditionally(url, "payload", 206, "pa");

        let b = binding(Strategy::StaleWhileRevalidate, "api-v1", None);
        let ranged = request_with(url, &[("range", "bytes=0-1")]);
        let served = h.engine.execute(&ranged, &b).await.unwrap();
        assert_eq!(served.response.status, 200);

        let served = h.engine.execute(&request(url), &b).await.unwrap();
        assert_eq!(served.from, ServedFrom::Cache);
        assert_eq!(served.response.status, 200);
        assert_eq!(served.response.body.as_ref(), b"payload");
    }

    #[tokio::test]
    async fn test_not_modified_and_partial_responses_are_not_stored() {
        let h = harness();
        let not_modified = "http://app.local/img/a.png";
        let partial = "http://app.local/static/js/main.js";
        h.fetcher.respond(not_modified, 304, "");
        h.fetcher.respond(partial, 206, "par");

        let dynamic = binding(Strategy::NetworkFirst, "dynamic-v1", Some(50));
        let served = h.engine.execute(&request(not_modified), &dynamic).await.unwrap();
        assert_eq!(served.response.status, 304);

        let shell = binding(Strategy::CacheFirst, "static-v1", None);
        let served = h.engine.execute(&request(partial), &shell).await.unwrap();
        assert_eq!(served.response.status, 206);

        assert!(!h.storage.has("dynamic-v1").await.unwrap());
        assert!(!h.storage.has("static-v1").await.unwrap());
        assert_eq!(h.engine.stats().await.skipped_writes, 2);
    }

    // ==================== Store failures ====================

    /// Storage whose stores reject every write
    struct ReadOnlyStorage {
        inner: MemoryStorage,
    }

    struct ReadOnlyStore {
        inner: Arc<dyn CacheStore>,
    }

    #[async_trait]
    impl CacheStore for ReadOnlyStore {
        fn name(&self) -> &str {
            self.inner.name()
        }

        async fn get(&self, key: &str) -> Result<Option<ResponseSnapshot>, StorageError> {
            self.inner.get(key).await
        }

        async fn put(&self, _key: &str, _snapshot: ResponseSnapshot) -> Result<(), StorageError> {
            Err(StorageError::QuotaExceeded {
                store: self.inner.name().to_string(),
                message: "read-only".to_string(),
            })
        }

        async fn delete(&self, key: &str) -> Result<bool, StorageError> {
            self.inner.delete(key).await
        }

        async fn sequenced_keys(&self) -> Result<Vec<(u64, String)>, StorageError> {
            self.inner.sequenced_keys().await
        }

        async fn delete_if_seq(&self, key: &str, seq: u64) -> Result<bool, StorageError> {
            self.inner.delete_if_seq(key, seq).await
        }

        async fn len(&self) -> Result<u64, StorageError> {
            self.inner.len().await
        }

        async fn clear(&self) -> Result<u64, StorageError> {
            self.inner.clear().await
        }
    }

    #[async_trait]
    impl CacheStorage for ReadOnlyStorage {
        async fn open(&self, name: &str) -> Result<Arc<dyn CacheStore>, StorageError> {
            let inner = self.inner.open(name).await?;
            Ok(Arc::new(ReadOnlyStore { inner }) as Arc<dyn CacheStore>)
        }

        async fn has(&self, name: &str) -> Result<bool, StorageError> {
            self.inner.has(name).await
        }

        async fn names(&self) -> Result<Vec<String>, StorageError> {
            self.inner.names().await
        }

        async fn delete(&self, name: &str) -> Result<bool, StorageError> {
            self.inner.delete(name).await
        }
    }

    #[tokio::test]
    async fn test_failed_write_still_returns_network_response() {
        let storage = Arc::new(ReadOnlyStorage {
            inner: MemoryStorage::new(),
        });
        let fetcher = Arc::new(ScriptedFetcher::new());
        let engine = StrategyEngine::new(storage.clone(), fetcher.clone(), WritePolicy::All, false);

        let url = "http://app.local/img/a.png";
        fetcher.respond(url, 200, "body");

        let b = binding(Strategy::NetworkFirst, "dynamic-v1", Some(1));
        let served = engine.execute(&request(url), &b).await.unwrap();

        assert_eq!(served.from, ServedFrom::Network);
        assert_eq!(served.response.body.as_ref(), b"body");
        assert_eq!(engine.stats().await.store_errors, 1);

        let store = storage.open("dynamic-v1").await.unwrap();
        assert_eq!(store.len().await.unwrap(), 0);
    }
}
