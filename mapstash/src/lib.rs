//! mapstash - Bounded local disk cache for slippy-map imagery tiles
//!
//! This library lets an application pre-fetch map tiles over an area or a set
//! of challenge locations and later serve them from disk without
//! connectivity. The cache is bounded: a persisted index tracks every tile's
//! size and access time, and a hybrid TTL + least-recently-used eviction
//! policy keeps the total under a configured ceiling.
//!
//! # High-Level API
//!
//! The [`service`] module provides the engine facade:
//!
//! ```ignore
//! use mapstash::config::CacheConfig;
//! use mapstash::service::MapCacheService;
//!
//! let cache = MapCacheService::new(CacheConfig::default())?;
//!
//! // Prefetch a 2 km area around a point at the default zoom levels
//! let summary = cache
//!     .download_area_tiles(45.52, -122.68, 2.0, None, |p| {
//!         println!("{}%", p.percentage);
//!     })
//!     .await?;
//! println!("{} downloaded, {} failed, {} already cached",
//!     summary.success, summary.failed, summary.skipped);
//!
//! // Serve a single tile (downloads on miss)
//! let path = cache.get_tile(15, 10518, 11742).await;
//! ```

pub mod cache;
pub mod config;
pub mod coord;
pub mod kv;
pub mod logging;
pub mod prefetch;
pub mod provider;
pub mod service;
pub mod tile;

/// Version of the mapstash library and CLI.
///
/// This is synchronized across all components in the workspace.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
