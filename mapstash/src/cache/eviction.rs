//! Hybrid TTL + LRU eviction.
//!
//! A single pass visits entries ordered by last access time (oldest first)
//! and evicts an entry when either its age since download exceeds the TTL or
//! the aggregate size still exceeds the eviction target. The target sits
//! below the ceiling (default 80%) so a pass frees headroom and the cache is
//! not evicting again on every marginal insert.

use std::io;

use chrono::{Duration, Utc};
use tracing::{debug, warn};

use crate::cache::types::CacheIndex;

/// Conservative per-tile size estimate used to decide whether a download
/// needs an eviction pass first. As long as real tiles stay under this, the
/// aggregate size never exceeds the ceiling after any single download.
pub const ESTIMATED_TILE_BYTES: u64 = 100 * 1024;

/// Result of an eviction pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvictionResult {
    /// Number of entries evicted
    pub evicted: usize,
    /// Total bytes freed
    pub bytes_freed: u64,
}

/// Enforces the cache size ceiling on a loaded index.
#[derive(Debug, Clone)]
pub struct EvictionManager {
    ttl: Duration,
    max_size_bytes: u64,
    target_fraction: f64,
}

impl EvictionManager {
    /// Create an eviction manager.
    ///
    /// # Arguments
    ///
    /// * `ttl` - Maximum age since download before an entry is evicted
    ///   regardless of access recency
    /// * `max_size_bytes` - Cache size ceiling
    /// * `target_fraction` - Fraction of the ceiling to evict down to
    pub fn new(ttl: Duration, max_size_bytes: u64, target_fraction: f64) -> Self {
        Self {
            ttl,
            max_size_bytes,
            target_fraction,
        }
    }

    /// Size the cache is reduced to when a pass runs while over target.
    pub fn target_bytes(&self) -> u64 {
        (self.max_size_bytes as f64 * self.target_fraction) as u64
    }

    /// True if adding one more tile could push the aggregate size past the
    /// ceiling, so a download should be preceded by an eviction pass.
    pub fn needs_eviction(&self, index: &CacheIndex) -> bool {
        index.total_size_bytes + ESTIMATED_TILE_BYTES > self.max_size_bytes
    }

    /// Run one eviction pass over a loaded index.
    ///
    /// Entries are visited ordered by `last_accessed_at` ascending; one linear
    /// pass suffices because that is the primary eviction criterion. Every
    /// TTL-expired entry is evicted unconditionally; additionally entries are
    /// evicted while the aggregate size remains above the target. Backing
    /// files are deleted idempotently (an already-missing file is fine); a
    /// hard delete failure is logged and the entry is kept for a later pass.
    pub async fn run_pass(&self, index: &mut CacheIndex) -> EvictionResult {
        let now = Utc::now();
        let target = self.target_bytes();

        let mut order: Vec<(String, chrono::DateTime<Utc>)> = index
            .tiles
            .iter()
            .map(|(key, info)| (key.clone(), info.last_accessed_at))
            .collect();
        order.sort_by_key(|(_, accessed)| *accessed);

        let mut result = EvictionResult::default();

        for (key, _) in order {
            let Some(info) = index.tiles.get(&key) else {
                continue;
            };

            let expired = now.signed_duration_since(info.downloaded_at) > self.ttl;
            if !expired && index.total_size_bytes <= target {
                continue;
            }
            let path = info.local_path.clone();

            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "Failed to delete tile file during eviction, keeping entry"
                    );
                    continue;
                }
            }

            if let Some(removed) = index.remove(&key) {
                result.evicted += 1;
                result.bytes_freed += removed.size_bytes;
                debug!(key = %key, expired, bytes = removed.size_bytes, "Evicted tile");
            }
        }

        index.last_cleanup_at = now;

        if result.evicted > 0 {
            debug!(
                evicted = result.evicted,
                bytes_freed = result.bytes_freed,
                remaining_bytes = index.total_size_bytes,
                target_bytes = target,
                "Eviction pass complete"
            );
        }

        result
    }
}
