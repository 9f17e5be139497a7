//! Cache index, eviction, and statistics.
//!
//! The index is a durable map from tile key to tile metadata with an
//! incrementally maintained aggregate size, persisted as one value in a
//! key-value store. Eviction keeps the aggregate under a configured ceiling
//! with a hybrid TTL + least-recently-used policy.

mod eviction;
mod index;
mod stats;
mod types;

pub use eviction::{EvictionManager, EvictionResult, ESTIMATED_TILE_BYTES};
pub use index::IndexStore;
pub use stats::compute_stats;
pub use types::{key_to_filename, tile_key, CacheError, CacheIndex, CacheStats, TileInfo};
