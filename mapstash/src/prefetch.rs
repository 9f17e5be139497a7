//! Prefetch work-list computation and batch reporting types.
//!
//! Both prefetch entry points reduce to "compute a tile work list, download
//! the missing ones sequentially, tolerate partial failure, report progress".
//! The geometry half lives here; the batch loop itself is driven by the
//! service facade so it can share one index load/save per batch.

use crate::coord::{
    self, BoundingBox, Coordinate, CoordError, TileCoord,
};

/// Kilometres per degree of latitude (flat-earth approximation).
pub const KM_PER_DEG_LAT: f64 = 111.0;

/// Padding added around the tight bounding box of hunt locations.
pub const HUNT_PADDING_KM: f64 = 0.5;

/// Minimum prefetch radius for a hunt, however tight its locations.
pub const MIN_HUNT_RADIUS_KM: f64 = 1.0;

/// Progress of a running batch download. Ephemeral, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    /// Tiles processed so far (including failures and skips)
    pub downloaded: usize,
    /// Total tiles in the batch
    pub total: usize,
    /// Rounded completion percentage
    pub percentage: u32,
}

impl DownloadProgress {
    /// Progress after `downloaded` of `total` tiles.
    pub fn new(downloaded: usize, total: usize) -> Self {
        let percentage = if total == 0 {
            100
        } else {
            (downloaded as f64 / total as f64 * 100.0).round() as u32
        };
        Self {
            downloaded,
            total,
            percentage,
        }
    }
}

/// Outcome counts of a batch download.
///
/// Batches never fail outright; per-tile failures are counted here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrefetchSummary {
    /// Tiles downloaded in this batch
    pub success: usize,
    /// Tiles whose download failed
    pub failed: usize,
    /// Tiles already cached
    pub skipped: usize,
}

/// Bounding box around a center point with a radius in kilometres.
///
/// Flat-earth approximation: one degree of latitude is taken as 111 km, and
/// the longitude span is widened by the meridian convergence factor
/// `cos(lat)`. Accurate enough at city scale, which is all a prefetch needs.
pub fn area_bounding_box(center: Coordinate, radius_km: f64) -> BoundingBox {
    let lat_delta = radius_km / KM_PER_DEG_LAT;
    let lng_delta = radius_km / (KM_PER_DEG_LAT * center.lat.to_radians().cos());

    BoundingBox::new(
        center.lat - lat_delta,
        center.lng - lng_delta,
        center.lat + lat_delta,
        center.lng + lng_delta,
    )
}

/// Center and radius covering a set of hunt locations.
///
/// The radius is half the diagonal of the tight bounding box plus a fixed
/// padding, floored at a minimum so a single-location hunt still caches a
/// useful neighbourhood. Returns `None` for an empty location list.
pub fn hunt_area(locations: &[Coordinate]) -> Option<(Coordinate, f64)> {
    let bbox = BoundingBox::enclosing(locations)?;
    let center = bbox.center();

    let lat_extent_km = (bbox.max_lat - bbox.min_lat) * KM_PER_DEG_LAT;
    let lng_extent_km =
        (bbox.max_lng - bbox.min_lng) * KM_PER_DEG_LAT * center.lat.to_radians().cos();
    let diagonal_km = (lat_extent_km * lat_extent_km + lng_extent_km * lng_extent_km).sqrt();

    let radius_km = (diagonal_km / 2.0 + HUNT_PADDING_KM).max(MIN_HUNT_RADIUS_KM);
    Some((center, radius_km))
}

/// Flat work list for an area prefetch: the union of the bounding-box grids
/// across all requested zoom levels.
///
/// The center must be a valid Web Mercator coordinate; the derived box is
/// then clamped to the projection envelope, so a radius reaching past a map
/// edge covers the clamped area instead of failing.
pub fn area_work_list(
    center: Coordinate,
    radius_km: f64,
    zoom_levels: &[u8],
) -> Result<Vec<TileCoord>, CoordError> {
    // Validates latitude, longitude and implicitly that the center is usable
    let max_zoom = zoom_levels.iter().copied().max().unwrap_or(0);
    coord::to_tile_coords(center.lat, center.lng, max_zoom)?;

    let bbox = area_bounding_box(center, radius_km).clamped();

    let mut work = Vec::new();
    for &zoom in zoom_levels {
        work.extend(coord::tiles_in_bounding_box(&bbox, zoom)?);
    }
    Ok(work)
}
