//! Core types for the tile cache index.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::coord::{CoordError, TileCoord};

/// Cache-related errors.
#[derive(Debug, Error)]
pub enum CacheError {
    /// I/O error during cache operations
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid geographic input
    #[error(transparent)]
    Coord(#[from] CoordError),

    /// Invalid cache configuration
    #[error("Invalid cache configuration: {0}")]
    InvalidConfig(String),
}

/// Stable string key for a tile, e.g. `"15/12754/5279"`.
///
/// Derived deterministically from the tile coordinates, so the same tile maps
/// to the same key across process restarts.
pub fn tile_key(coord: &TileCoord) -> String {
    format!("{}/{}/{}", coord.zoom, coord.x, coord.y)
}

/// Flat filesystem-safe filename for a tile key.
///
/// `"15/12754/5279"` becomes `"15_12754_5279.png"`; every cached tile lives
/// directly under the cache directory.
pub fn key_to_filename(key: &str) -> String {
    format!("{}.png", key.replace('/', "_"))
}

/// Metadata for one cached tile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileInfo {
    /// URL the tile was downloaded from
    pub url: String,
    /// Local file holding the tile image
    pub local_path: PathBuf,
    /// Actual on-disk size in bytes
    pub size_bytes: u64,
    /// When the tile was downloaded
    pub downloaded_at: DateTime<Utc>,
    /// When the tile was last served from the cache
    pub last_accessed_at: DateTime<Utc>,
    /// Tile coordinates
    pub coord: TileCoord,
}

/// The persisted cache index: tile key → metadata plus aggregate size.
///
/// `total_size_bytes` always equals the sum of `size_bytes` over all entries.
/// It is maintained incrementally on every insert and remove; a full
/// recomputation happens only as a consistency check when the index is loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheIndex {
    pub tiles: HashMap<String, TileInfo>,
    pub total_size_bytes: u64,
    pub last_cleanup_at: DateTime<Utc>,
}

impl CacheIndex {
    /// A fresh index with no entries.
    pub fn empty() -> Self {
        Self {
            tiles: HashMap::new(),
            total_size_bytes: 0,
            last_cleanup_at: Utc::now(),
        }
    }

    /// Insert or replace an entry, adjusting the aggregate size by the signed
    /// delta between the old and new entry.
    pub fn upsert(&mut self, key: String, info: TileInfo) {
        let new_size = info.size_bytes;
        if let Some(old) = self.tiles.insert(key, info) {
            if new_size > old.size_bytes {
                self.total_size_bytes += new_size - old.size_bytes;
            } else {
                self.total_size_bytes -= old.size_bytes - new_size;
            }
        } else {
            self.total_size_bytes += new_size;
        }
    }

    /// Remove an entry if present, decrementing the aggregate size.
    ///
    /// Returns the removed entry, or `None` if the key was absent.
    pub fn remove(&mut self, key: &str) -> Option<TileInfo> {
        let info = self.tiles.remove(key)?;
        self.total_size_bytes = self.total_size_bytes.saturating_sub(info.size_bytes);
        Some(info)
    }

    /// Number of entries in the index.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// True if the index has no entries.
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Sum of `size_bytes` over all entries, computed by full scan.
    ///
    /// Only used to validate `total_size_bytes` during load.
    pub fn computed_size_bytes(&self) -> u64 {
        self.tiles.values().map(|t| t.size_bytes).sum()
    }
}

/// Aggregate cache statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheStats {
    /// Number of cached tiles
    pub tile_count: usize,
    /// Total size in megabytes, rounded to two decimals
    pub total_size_mb: f64,
    /// Configured size ceiling in megabytes
    pub max_size_mb: u64,
    /// Percentage of the ceiling in use, rounded to the nearest integer
    pub percent_used: u32,
}
