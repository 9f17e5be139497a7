//! Single-tile resolution: cache hit, or download on miss.
//!
//! `TileStore` operates on an already-loaded [`CacheIndex`] so batch callers
//! can run many tiles through one load/save cycle. The service facade wraps
//! these operations with the per-call load and save.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, warn};

use crate::cache::{key_to_filename, tile_key, CacheIndex, TileInfo};
use crate::coord::TileCoord;
use crate::provider::{AsyncHttpClient, TileSource};

/// Resolves tiles to local files, downloading on miss.
#[derive(Debug)]
pub struct TileStore<C: AsyncHttpClient> {
    client: C,
    source: TileSource,
    cache_dir: PathBuf,
}

impl<C: AsyncHttpClient> TileStore<C> {
    /// Create a tile store writing downloads under `cache_dir`.
    pub fn new(client: C, source: TileSource, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            source,
            cache_dir: cache_dir.into(),
        }
    }

    /// Directory the tile files live in.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Return the local path for a tile already in the cache.
    ///
    /// A hit requires both an index entry and the backing file still existing
    /// on disk; the entry's access time is refreshed. An entry whose file has
    /// vanished is a miss, not an error — the index is left untouched and the
    /// caller falls through to a fresh download.
    pub async fn cached(&self, index: &mut CacheIndex, coord: &TileCoord) -> Option<PathBuf> {
        let key = tile_key(coord);
        let info = index.tiles.get_mut(&key)?;

        match tokio::fs::try_exists(&info.local_path).await {
            Ok(true) => {
                info.last_accessed_at = Utc::now();
                Some(info.local_path.clone())
            }
            Ok(false) => {
                debug!(key = %key, path = %info.local_path.display(), "Cached tile file vanished");
                None
            }
            Err(e) => {
                debug!(key = %key, error = %e, "Could not stat cached tile file");
                None
            }
        }
    }

    /// Download a tile and record it in the index.
    ///
    /// On success the entry's size is the actual on-disk file size (not a
    /// content-length header, which compression or truncation can skew) and
    /// both timestamps are set to now. Any HTTP or filesystem failure yields
    /// `None` without mutating the index.
    pub async fn download(&self, index: &mut CacheIndex, coord: &TileCoord) -> Option<PathBuf> {
        let key = tile_key(coord);
        let url = self.source.url_for(coord);
        let path = self.cache_dir.join(key_to_filename(&key));

        if let Err(e) = tokio::fs::create_dir_all(&self.cache_dir).await {
            warn!(dir = %self.cache_dir.display(), error = %e, "Failed to create cache directory");
            return None;
        }

        let body = match self.client.get(&url, &self.source.headers()).await {
            Ok(body) => body,
            Err(e) => {
                debug!(key = %key, url = %url, error = %e, "Tile download failed");
                return None;
            }
        };

        if let Err(e) = tokio::fs::write(&path, &body).await {
            warn!(path = %path.display(), error = %e, "Failed to write tile file");
            return None;
        }

        let size_bytes = actual_file_size(&path, body.len() as u64).await;
        let now = Utc::now();
        index.upsert(
            key.clone(),
            TileInfo {
                url,
                local_path: path.clone(),
                size_bytes,
                downloaded_at: now,
                last_accessed_at: now,
                coord: *coord,
            },
        );

        debug!(key = %key, bytes = size_bytes, "Tile downloaded");
        Some(path)
    }

    /// Resolve a tile: cache hit, or download on miss.
    pub async fn get_tile(&self, index: &mut CacheIndex, coord: &TileCoord) -> Option<PathBuf> {
        if let Some(path) = self.cached(index, coord).await {
            return Some(path);
        }
        self.download(index, coord).await
    }
}

/// Size of the file just written, falling back to the body length if the
/// metadata read fails.
async fn actual_file_size(path: &Path, fallback: u64) -> u64 {
    match tokio::fs::metadata(path).await {
        Ok(meta) => meta.len(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Could not stat downloaded tile");
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use tempfile::TempDir;

    use crate::provider::ProviderError;

    /// Scripted HTTP client: returns the configured response and counts calls.
    struct ScriptedClient {
        response: Mutex<Result<Vec<u8>, ProviderError>>,
        calls: AtomicUsize,
    }

    impl ScriptedClient {
        fn ok(body: Vec<u8>) -> Self {
            Self {
                response: Mutex::new(Ok(body)),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(status: u16) -> Self {
            Self {
                response: Mutex::new(Err(ProviderError::Status {
                    status,
                    url: "https://tiles.example.com".to_string(),
                })),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl AsyncHttpClient for ScriptedClient {
        async fn get(
            &self,
            _url: &str,
            _headers: &[(&str, &str)],
        ) -> Result<Vec<u8>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response.lock().unwrap().clone()
        }
    }

    fn store(client: ScriptedClient, dir: &Path) -> TileStore<ScriptedClient> {
        TileStore::new(
            client,
            TileSource::new("https://tiles.example.com/{z}/{x}/{y}.png", "mapstash test"),
            dir,
        )
    }

    fn coord() -> TileCoord {
        TileCoord {
            x: 100,
            y: 200,
            zoom: 15,
        }
    }

    #[tokio::test]
    async fn download_records_actual_file_size() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(ScriptedClient::ok(vec![7u8; 1234]), temp_dir.path());
        let mut index = CacheIndex::empty();

        let path = store.download(&mut index, &coord()).await.unwrap();

        assert!(path.exists());
        assert_eq!(path.file_name().unwrap(), "15_100_200.png");
        let info = &index.tiles[&tile_key(&coord())];
        assert_eq!(info.size_bytes, 1234);
        assert_eq!(index.total_size_bytes, 1234);
        assert_eq!(info.downloaded_at, info.last_accessed_at);
    }

    #[tokio::test]
    async fn failed_download_leaves_index_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(ScriptedClient::failing(503), temp_dir.path());
        let mut index = CacheIndex::empty();

        let result = store.get_tile(&mut index, &coord()).await;

        assert!(result.is_none());
        assert!(index.is_empty());
        assert_eq!(index.total_size_bytes, 0);
    }

    #[tokio::test]
    async fn second_get_is_a_hit_with_one_download() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(ScriptedClient::ok(vec![1u8; 64]), temp_dir.path());
        let mut index = CacheIndex::empty();

        let first = store.get_tile(&mut index, &coord()).await.unwrap();
        let second = store.get_tile(&mut index, &coord()).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.client.calls(), 1);
    }

    #[tokio::test]
    async fn hit_refreshes_access_time() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(ScriptedClient::ok(vec![1u8; 64]), temp_dir.path());
        let mut index = CacheIndex::empty();

        store.get_tile(&mut index, &coord()).await.unwrap();
        let before = index.tiles[&tile_key(&coord())].last_accessed_at;

        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        store.get_tile(&mut index, &coord()).await.unwrap();
        let after = index.tiles[&tile_key(&coord())].last_accessed_at;

        assert!(after > before);
    }

    #[tokio::test]
    async fn vanished_file_triggers_fresh_download() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(ScriptedClient::ok(vec![1u8; 64]), temp_dir.path());
        let mut index = CacheIndex::empty();

        let path = store.get_tile(&mut index, &coord()).await.unwrap();
        std::fs::remove_file(&path).unwrap();

        let again = store.get_tile(&mut index, &coord()).await.unwrap();

        assert!(again.exists());
        assert_eq!(store.client.calls(), 2);
        assert_eq!(index.len(), 1);
        assert_eq!(index.total_size_bytes, 64);
    }
}
