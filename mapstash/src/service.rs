//! High-level cache engine facade.
//!
//! `MapCacheService` wires the coordinate mapper, index store, tile store and
//! eviction manager into the public cache operations. Every public operation
//! runs a full load–mutate–save cycle against the persisted index and holds
//! the service's single-writer lock for its duration, so overlapping calls
//! serialize instead of racing on load/save.

use std::io;
use std::path::PathBuf;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::cache::{
    compute_stats, CacheError, CacheStats, EvictionManager, EvictionResult, IndexStore,
};
use crate::config::CacheConfig;
use crate::coord::{Coordinate, TileCoord, MAX_ZOOM};
use crate::kv::{FileKvStore, KvStore};
use crate::prefetch::{self, DownloadProgress, PrefetchSummary};
use crate::provider::{AsyncHttpClient, AsyncReqwestClient, TileSource};
use crate::tile::TileStore;

/// The tile cache engine.
///
/// One instance owns one cache directory and one persisted index key; callers
/// can construct several independent instances with distinct configurations.
pub struct MapCacheService<S: KvStore, C: AsyncHttpClient> {
    config: CacheConfig,
    index: IndexStore<S>,
    tiles: TileStore<C>,
    eviction: EvictionManager,
    /// Serializes public operations; see the module docs.
    op_lock: Mutex<()>,
}

impl MapCacheService<FileKvStore, AsyncReqwestClient> {
    /// Create an engine backed by the file key-value store and a real HTTP
    /// client, per the configuration.
    pub fn new(config: CacheConfig) -> Result<Self, CacheError> {
        let client = AsyncReqwestClient::new(config.http_timeout_secs)
            .map_err(|e| CacheError::InvalidConfig(e.to_string()))?;
        let store = FileKvStore::new(&config.state_dir);
        Ok(Self::with_parts(config, store, client))
    }
}

impl<S: KvStore, C: AsyncHttpClient> MapCacheService<S, C> {
    /// Create an engine from explicit collaborators.
    ///
    /// This is the seam tests use to inject an in-memory store and a scripted
    /// HTTP client.
    pub fn with_parts(config: CacheConfig, store: S, client: C) -> Self {
        let index = IndexStore::new(store, config.index_key.clone());
        let source = TileSource::new(config.url_template.clone(), config.user_agent.clone());
        let tiles = TileStore::new(client, source, config.cache_dir.clone());
        let eviction = EvictionManager::new(
            config.ttl(),
            config.max_size_bytes(),
            config.eviction_target_fraction,
        );

        Self {
            config,
            index,
            tiles,
            eviction,
            op_lock: Mutex::new(()),
        }
    }

    /// The engine's configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Resolve a single tile to a local file, downloading on miss.
    ///
    /// Returns `None` ("absent") for out-of-range coordinates, a failed
    /// download, or any other reason the tile cannot be produced; the caller
    /// renders a gap or placeholder.
    pub async fn get_tile(&self, zoom: u8, x: u32, y: u32) -> Option<PathBuf> {
        if zoom > MAX_ZOOM || u64::from(x) >= 1u64 << zoom || u64::from(y) >= 1u64 << zoom {
            warn!(zoom, x, y, "Tile request outside the valid grid");
            return None;
        }
        let coord = TileCoord { x, y, zoom };

        let _guard = self.op_lock.lock().await;
        let mut index = self.index.load().await;
        let result = self.tiles.get_tile(&mut index, &coord).await;
        self.index.save(&index).await;
        result
    }

    /// Prefetch every tile covering a circular area at the given zoom levels.
    ///
    /// `zoom_levels` of `None` uses the configured defaults. `on_progress` is
    /// invoked after every tile, whatever its outcome. Per-tile failures are
    /// counted in the summary, never raised; the only error is an invalid
    /// center coordinate, reported before any network activity.
    pub async fn download_area_tiles(
        &self,
        center_lat: f64,
        center_lng: f64,
        radius_km: f64,
        zoom_levels: Option<&[u8]>,
        on_progress: impl FnMut(DownloadProgress),
    ) -> Result<PrefetchSummary, CacheError> {
        let zooms = zoom_levels.unwrap_or(&self.config.default_zoom_levels);
        let center = Coordinate::new(center_lat, center_lng);
        let work = prefetch::area_work_list(center, radius_km, zooms)?;

        let _guard = self.op_lock.lock().await;
        info!(
            lat = center_lat,
            lng = center_lng,
            radius_km,
            tiles = work.len(),
            "Starting area prefetch"
        );
        Ok(self.run_batch(work, on_progress).await)
    }

    /// Prefetch map coverage for a set of hunt challenge locations.
    ///
    /// Computes the tight bounding box over the locations, derives a center
    /// and padded radius, and downloads the hunt zoom levels for that area.
    /// An empty location list returns an all-zero summary with no network
    /// activity.
    pub async fn download_hunt_tiles(
        &self,
        locations: &[Coordinate],
        on_progress: impl FnMut(DownloadProgress),
    ) -> Result<PrefetchSummary, CacheError> {
        let Some((center, radius_km)) = prefetch::hunt_area(locations) else {
            return Ok(PrefetchSummary::default());
        };

        self.download_area_tiles(
            center.lat,
            center.lng,
            radius_km,
            Some(&self.config.hunt_zoom_levels),
            on_progress,
        )
        .await
    }

    /// Aggregate statistics over the persisted index.
    pub async fn get_cache_stats(&self) -> CacheStats {
        let _guard = self.op_lock.lock().await;
        let index = self.index.load().await;
        compute_stats(&index, self.config.max_cache_mb)
    }

    /// Delete every cached tile and the persisted index key.
    ///
    /// Idempotent: a missing cache directory or index key is fine. Delete
    /// failures are logged and swallowed; the next load regenerates a fresh
    /// empty index either way.
    pub async fn clear_map_cache(&self) {
        let _guard = self.op_lock.lock().await;

        match tokio::fs::remove_dir_all(&self.config.cache_dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(
                    dir = %self.config.cache_dir.display(),
                    error = %e,
                    "Failed to remove cache directory"
                );
            }
        }
        self.index.delete().await;
        info!("Map cache cleared");
    }

    /// Run an eviction pass directly.
    ///
    /// Prefetch batches trigger eviction opportunistically; this entry point
    /// lets callers reclaim space on their own schedule.
    pub async fn run_eviction(&self) -> EvictionResult {
        let _guard = self.op_lock.lock().await;
        let mut index = self.index.load().await;
        let result = self.eviction.run_pass(&mut index).await;
        self.index.save(&index).await;
        result
    }

    /// Sequential batch download over a work list.
    ///
    /// One index load and one save for the whole batch. Before each download
    /// the ceiling is checked and an eviction pass frees headroom if the
    /// cache has filled, so the aggregate size never exceeds the ceiling
    /// after any single tile.
    async fn run_batch(
        &self,
        work: Vec<TileCoord>,
        mut on_progress: impl FnMut(DownloadProgress),
    ) -> PrefetchSummary {
        let mut index = self.index.load().await;
        let total = work.len();
        let mut summary = PrefetchSummary::default();

        for (i, coord) in work.iter().enumerate() {
            if self.tiles.cached(&mut index, coord).await.is_some() {
                summary.skipped += 1;
            } else {
                if self.eviction.needs_eviction(&index) {
                    let result = self.eviction.run_pass(&mut index).await;
                    debug!(
                        evicted = result.evicted,
                        bytes_freed = result.bytes_freed,
                        "Mid-batch eviction pass"
                    );
                }

                match self.tiles.download(&mut index, coord).await {
                    Some(_) => summary.success += 1,
                    None => summary.failed += 1,
                }
            }

            on_progress(DownloadProgress::new(i + 1, total));
        }

        self.index.save(&index).await;
        info!(
            success = summary.success,
            failed = summary.failed,
            skipped = summary.skipped,
            total,
            "Prefetch batch complete"
        );
        summary
    }
}
