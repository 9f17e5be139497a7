//! Read-only aggregate statistics over the cache index.

use crate::cache::types::{CacheIndex, CacheStats};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Compute aggregate statistics for a loaded index.
///
/// `total_size_mb` is rounded to two decimals; `percent_used` to the nearest
/// integer percentage of the configured ceiling.
pub fn compute_stats(index: &CacheIndex, max_size_mb: u64) -> CacheStats {
    let total_size_mb = round2(index.total_size_bytes as f64 / BYTES_PER_MB);
    let percent_used = if max_size_mb == 0 {
        0
    } else {
        (total_size_mb / max_size_mb as f64 * 100.0).round() as u32
    };

    CacheStats {
        tile_count: index.len(),
        total_size_mb,
        max_size_mb,
        percent_used,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use chrono::Utc;

    use crate::cache::types::{tile_key, TileInfo};
    use crate::coord::TileCoord;

    fn index_with_bytes(total: u64) -> CacheIndex {
        let mut index = CacheIndex::empty();
        let coord = TileCoord {
            x: 1,
            y: 2,
            zoom: 14,
        };
        let now = Utc::now();
        index.upsert(
            tile_key(&coord),
            TileInfo {
                url: "https://tiles.example.com/14/1/2.png".to_string(),
                local_path: PathBuf::from("/tmp/14_1_2.png"),
                size_bytes: total,
                downloaded_at: now,
                last_accessed_at: now,
                coord,
            },
        );
        index
    }

    #[test]
    fn empty_index_is_all_zeros() {
        let stats = compute_stats(&CacheIndex::empty(), 100);
        assert_eq!(stats.tile_count, 0);
        assert_eq!(stats.total_size_mb, 0.0);
        assert_eq!(stats.max_size_mb, 100);
        assert_eq!(stats.percent_used, 0);
    }

    #[test]
    fn size_is_rounded_to_two_decimals() {
        // 5 MB + 300 KB = 5.29296875 MB -> 5.29
        let stats = compute_stats(&index_with_bytes(5 * 1024 * 1024 + 300 * 1024), 100);
        assert_eq!(stats.total_size_mb, 5.29);
        assert_eq!(stats.percent_used, 5);
    }

    #[test]
    fn percent_used_is_rounded() {
        // 50.4 MB of 100 MB -> 50%
        let stats = compute_stats(&index_with_bytes(50 * 1024 * 1024 + 410 * 1024), 100);
        assert_eq!(stats.percent_used, 50);

        // 25 MB of 50 MB -> 50%
        let stats = compute_stats(&index_with_bytes(25 * 1024 * 1024), 50);
        assert_eq!(stats.percent_used, 50);
    }

    #[test]
    fn zero_ceiling_does_not_divide_by_zero() {
        let stats = compute_stats(&index_with_bytes(1024), 0);
        assert_eq!(stats.percent_used, 0);
    }
}
