//! Test doubles shared by the core unit tests

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use parking_lot::Mutex;
use shellcache_fetch::{FetchError, Fetcher};
use shellcache_storage::ResponseSnapshot;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Notify;
use url::Url;

use crate::request::CacheRequest;

#[derive(Clone)]
enum Script {
    Respond(ResponseSnapshot),
    Fail,
    Gated(ResponseSnapshot, Arc<Notify>),
    /// Origin honouring conditional and range headers
    Conditional {
        full: ResponseSnapshot,
        partial: ResponseSnapshot,
    },
}

/// Fetcher answering from a per-URL script
///
/// Scripts queued for one URL are consumed in order; the last one repeats.
/// Unscripted URLs fail as unreachable.
#[derive(Default)]
pub struct ScriptedFetcher {
    scripts: Mutex<HashMap<String, VecDeque<Script>>>,
    calls: AtomicUsize,
    sent_headers: Mutex<Vec<HeaderMap>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, url: &str, script: Script) {
        self.scripts
            .lock()
            .entry(url.to_string())
            .or_default()
            .push_back(script);
    }

    pub fn respond(&self, url: &str, status: u16, body: &str) {
        self.push(
            url,
            Script::Respond(ResponseSnapshot::new(status, vec![], body.to_string())),
        );
    }

    pub fn fail(&self, url: &str) {
        self.push(url, Script::Fail);
    }

    /// Respond only once the returned gate is notified
    pub fn gate(&self, url: &str, status: u16, body: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.push(
            url,
            Script::Gated(
                ResponseSnapshot::new(status, vec![], body.to_string()),
                gate.clone(),
            ),
        );
        gate
    }

    /// Answer `partial_status` with `partial_body` when the request carries
    /// a range or conditional header, the full body otherwise
    pub fn respond_conditionally(
        &self,
        url: &str,
        body: &str,
        partial_status: u16,
        partial_body: &str,
    ) {
        self.push(
            url,
            Script::Conditional {
                full: ResponseSnapshot::new(200, vec![], body.to_string()),
                partial: ResponseSnapshot::new(partial_status, vec![], partial_body.to_string()),
            },
        );
    }

    /// Drop every script for `url`
    pub fn forget(&self, url: &str) {
        self.scripts.lock().remove(url);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Headers of every fetch so far, in call order
    pub fn sent_headers(&self) -> Vec<HeaderMap> {
        self.sent_headers.lock().clone()
    }

    fn next_script(&self, url: &str) -> Option<Script> {
        let mut scripts = self.scripts.lock();
        let queue = scripts.get_mut(url)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, url: &Url, headers: &HeaderMap) -> Result<ResponseSnapshot, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.sent_headers.lock().push(headers.clone());

        match self.next_script(url.as_str()) {
            Some(Script::Respond(response)) => Ok(response),
            Some(Script::Gated(response, gate)) => {
                gate.notified().await;
                Ok(response)
            }
            Some(Script::Conditional { full, partial }) => {
                let conditional = ["range", "if-none-match", "if-modified-since"]
                    .iter()
                    .any(|name| headers.contains_key(*name));
                Ok(if conditional { partial } else { full })
            }
            Some(Script::Fail) | None => Err(FetchError::Unreachable(url.to_string())),
        }
    }

    async fn forward(
        &self,
        _method: Method,
        url: &Url,
        headers: &HeaderMap,
        _body: Bytes,
    ) -> Result<ResponseSnapshot, FetchError> {
        self.fetch(url, headers).await
    }
}

pub fn request(url: &str) -> CacheRequest {
    CacheRequest::get(Url::parse(url).unwrap())
}

pub fn request_with(url: &str, headers: &[(&'static str, &'static str)]) -> CacheRequest {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        map.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
    CacheRequest::new(Url::parse(url).unwrap(), map)
}

/// Poll `check` until it holds, panicking after about five seconds
pub async fn eventually<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..1000 {
        if check().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}
