//! Durable storage of the cache index.
//!
//! The whole index is serialized as JSON under one fixed key in a [`KvStore`].
//! Losing it is harmless (tiles get re-downloaded), so persistence errors are
//! deliberately absorbed here: a failed or corrupt read yields a fresh empty
//! index, and a failed write is logged and swallowed.

use tracing::{debug, warn};

use crate::cache::types::CacheIndex;
use crate::kv::KvStore;

/// Loads and saves the [`CacheIndex`] against a key-value store.
#[derive(Debug)]
pub struct IndexStore<S: KvStore> {
    store: S,
    key: String,
}

impl<S: KvStore> IndexStore<S> {
    /// Create an index store persisting under `key`.
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Load the index.
    ///
    /// Never fails outward: a missing key, a read error, or unparseable
    /// content all yield a fresh empty index. After parsing, the aggregate
    /// size is validated against a full scan and corrected if they disagree.
    pub async fn load(&self) -> CacheIndex {
        let raw = match self.store.get(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return CacheIndex::empty(),
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to read cache index, starting empty");
                return CacheIndex::empty();
            }
        };

        let mut index: CacheIndex = match serde_json::from_str(&raw) {
            Ok(index) => index,
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to parse cache index, starting empty");
                return CacheIndex::empty();
            }
        };

        let computed = index.computed_size_bytes();
        if computed != index.total_size_bytes {
            warn!(
                recorded = index.total_size_bytes,
                computed = computed,
                "Cache index size accounting drifted, correcting"
            );
            index.total_size_bytes = computed;
        }

        debug!(
            tiles = index.len(),
            total_bytes = index.total_size_bytes,
            "Cache index loaded"
        );
        index
    }

    /// Save the index, best-effort.
    ///
    /// Write failures are logged and swallowed; a stale persisted index only
    /// causes redundant re-downloads, never corruption.
    pub async fn save(&self, index: &CacheIndex) {
        let raw = match serde_json::to_string(index) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Failed to serialize cache index, skipping save");
                return;
            }
        };

        if let Err(e) = self.store.set(&self.key, &raw).await {
            warn!(key = %self.key, error = %e, "Failed to persist cache index");
        }
    }

    /// Remove the persisted index key entirely.
    ///
    /// The next [`load`](Self::load) regenerates a fresh empty index.
    pub async fn delete(&self) {
        if let Err(e) = self.store.remove(&self.key).await {
            warn!(key = %self.key, error = %e, "Failed to remove cache index key");
        }
    }
}
