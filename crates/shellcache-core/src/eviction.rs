//! Entry-count eviction for bounded stores
//!
//! Strict FIFO: the oldest-inserted entries go first. Access recency,
//! age and payload size are never considered.

use shellcache_storage::{CacheStore, StorageError};
use tracing::{debug, info};

/// Remove the oldest entries of `store` until it holds at most `max_entries`
///
/// Returns the number of entries this call removed. Safe to run
/// concurrently with writes and with other eviction passes: an entry is only
/// removed while it still holds the insertion sequence the pass listed. A
/// pass over a store already within budget removes nothing.
pub async fn enforce_limit(store: &dyn CacheStore, max_entries: u64) -> Result<u64, StorageError> {
    let mut evicted = 0u64;

    loop {
        let keys = store.sequenced_keys().await?;
        let count = keys.len() as u64;

        if count <= max_entries {
            break;
        }

        let excess = (count - max_entries) as usize;
        for (seq, key) in keys.into_iter().take(excess) {
            // Skipped when another pass removed it or a write moved it to the newest end
            if store.delete_if_seq(&key, seq).await? {
                debug!("Evicted {} from {}", key, store.name());
                evicted += 1;
            }
        }
    }

    if evicted > 0 {
        info!(
            "Evicted {} entries from {} (limit: {})",
            evicted,
            store.name(),
            max_entries
        );
        metrics::counter!("shellcache_evictions_total", "store" => store.name().to_string())
            .increment(evicted);
    }

    Ok(evicted)
}
