//! Engine configuration.
//!
//! All tunables live here so callers can run multiple independent cache
//! instances (and tests can run hermetically) instead of sharing module-level
//! globals. Defaults match a phone-sized offline map cache.

use std::path::PathBuf;

use chrono::Duration;

/// Default cache size ceiling in megabytes.
pub const DEFAULT_MAX_CACHE_MB: u64 = 100;

/// Default tile time-to-live in days.
pub const DEFAULT_TILE_TTL_DAYS: u32 = 30;

/// Default zoom levels for area prefetch.
pub const DEFAULT_ZOOM_LEVELS: [u8; 3] = [14, 15, 16];

/// Zoom levels downloaded for hunt prefetch.
pub const HUNT_ZOOM_LEVELS: [u8; 4] = [14, 15, 16, 17];

/// Fraction of the ceiling eviction reduces the cache to.
///
/// Sitting below 1.0 gives hysteresis: a pass frees headroom so the next few
/// inserts don't each trigger another pass.
pub const DEFAULT_EVICTION_TARGET_FRACTION: f64 = 0.8;

/// Default tile endpoint template.
pub const DEFAULT_URL_TEMPLATE: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";

/// Default identifying User-Agent.
///
/// Public tile servers require an identifying agent and reject anonymous
/// clients.
pub const DEFAULT_USER_AGENT: &str = "mapstash/0.1 (+https://github.com/mapstash/mapstash)";

/// Default HTTP request timeout in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Key the serialized index is persisted under.
pub const DEFAULT_INDEX_KEY: &str = "tile-cache-index";

/// Configuration for a cache engine instance.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Directory holding the cached tile files.
    pub cache_dir: PathBuf,

    /// Directory for the file-backed index store.
    ///
    /// Kept outside `cache_dir` so clearing the tiles does not race the
    /// index file removal.
    pub state_dir: PathBuf,

    /// Key-value key the serialized index is stored under.
    pub index_key: String,

    /// Cache size ceiling in megabytes.
    pub max_cache_mb: u64,

    /// Tile time-to-live in days.
    pub tile_ttl_days: u32,

    /// Zoom levels used by area prefetch when the caller passes none.
    pub default_zoom_levels: Vec<u8>,

    /// Zoom levels used by hunt prefetch.
    pub hunt_zoom_levels: Vec<u8>,

    /// Fraction of the ceiling eviction reduces the cache to.
    pub eviction_target_fraction: f64,

    /// Remote tile endpoint with `{z}`/`{x}`/`{y}` placeholders.
    pub url_template: String,

    /// Identifying User-Agent sent with every tile request.
    pub user_agent: String,

    /// HTTP request timeout in seconds.
    pub http_timeout_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("mapstash/tiles"),
            state_dir: PathBuf::from("mapstash/state"),
            index_key: DEFAULT_INDEX_KEY.to_string(),
            max_cache_mb: DEFAULT_MAX_CACHE_MB,
            tile_ttl_days: DEFAULT_TILE_TTL_DAYS,
            default_zoom_levels: DEFAULT_ZOOM_LEVELS.to_vec(),
            hunt_zoom_levels: HUNT_ZOOM_LEVELS.to_vec(),
            eviction_target_fraction: DEFAULT_EVICTION_TARGET_FRACTION,
            url_template: DEFAULT_URL_TEMPLATE.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

impl CacheConfig {
    /// Set the tile directory.
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    /// Set the index store directory.
    pub fn with_state_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.state_dir = dir.into();
        self
    }

    /// Set the size ceiling in megabytes.
    pub fn with_max_cache_mb(mut self, mb: u64) -> Self {
        self.max_cache_mb = mb;
        self
    }

    /// Set the tile time-to-live in days.
    pub fn with_tile_ttl_days(mut self, days: u32) -> Self {
        self.tile_ttl_days = days;
        self
    }

    /// Set the tile endpoint template.
    pub fn with_url_template(mut self, template: impl Into<String>) -> Self {
        self.url_template = template.into();
        self
    }

    /// Size ceiling in bytes.
    pub fn max_size_bytes(&self) -> u64 {
        self.max_cache_mb * 1024 * 1024
    }

    /// Tile time-to-live as a duration.
    pub fn ttl(&self) -> Duration {
        Duration::days(self.tile_ttl_days as i64)
    }
}
