//! Opt-in write ordering for background refreshes

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

/// Per-key monotonic write guard
///
/// Every fetch takes a ticket when it is issued. A completed fetch may only
/// write if no fetch issued after it has written already.
#[derive(Default)]
pub struct WriteSequencer {
    next: AtomicU64,
    committed: Mutex<HashMap<String, u64>>,
}

impl WriteSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a ticket for a fetch that is about to be issued
    pub fn issue(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Run `write` if `ticket` is newer than the last committed one for `key`
    ///
    /// The guard is held across the write so two guarded writes for the
    /// same key can never land out of order. Returns whether the write ran.
    pub async fn commit<F, Fut>(&self, key: &str, ticket: u64, write: F) -> bool
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = ()>,
    {
        let mut committed = self.committed.lock().await;
        let last = committed.get(key).copied().unwrap_or(0);
        if ticket <= last {
            return false;
        }
        committed.insert(key.to_string(), ticket);
        write().await;
        true
    }
}
