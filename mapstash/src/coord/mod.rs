//! Coordinate conversion module
//!
//! Provides conversions between geographic coordinates (latitude/longitude)
//! and Web Mercator tile coordinates, plus enumeration of the tile grid
//! covering a bounding box.

mod types;

pub use types::{
    BoundingBox, Coordinate, CoordError, TileCoord, MAX_LAT, MAX_LNG, MAX_ZOOM, MIN_LAT, MIN_LNG,
    MIN_ZOOM,
};

use std::f64::consts::PI;

/// Converts geographic coordinates to tile coordinates.
///
/// # Arguments
///
/// * `lat` - Latitude in degrees (-85.05112878 to 85.05112878)
/// * `lng` - Longitude in degrees (-180.0 to 180.0)
/// * `zoom` - Zoom level (0 to 20)
///
/// # Returns
///
/// A `Result` containing the tile coordinates or an error if inputs are invalid.
#[inline]
pub fn to_tile_coords(lat: f64, lng: f64, zoom: u8) -> Result<TileCoord, CoordError> {
    if !(MIN_LAT..=MAX_LAT).contains(&lat) {
        return Err(CoordError::InvalidLatitude(lat));
    }
    if !(MIN_LNG..=MAX_LNG).contains(&lng) {
        return Err(CoordError::InvalidLongitude(lng));
    }
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }

    let n = 2.0_f64.powi(zoom as i32);

    let x = ((lng + 180.0) / 360.0 * n) as u32;

    let lat_rad = lat * PI / 180.0;
    let y = ((1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n) as u32;

    // lng == 180.0 and lat == MIN_LAT land exactly on the grid edge
    let max_index = (n as u32).saturating_sub(1);
    Ok(TileCoord {
        x: x.min(max_index),
        y: y.min(max_index),
        zoom,
    })
}

/// Converts tile coordinates back to geographic coordinates.
///
/// Returns the latitude/longitude of the tile's northwest corner.
#[inline]
pub fn tile_to_lat_lng(tile: &TileCoord) -> Coordinate {
    let n = 2.0_f64.powi(tile.zoom as i32);

    let lng = tile.x as f64 / n * 360.0 - 180.0;

    let y = tile.y as f64 / n;
    let lat_rad = (PI * (1.0 - 2.0 * y)).sinh().atan();
    let lat = lat_rad * 180.0 / PI;

    Coordinate::new(lat, lng)
}

/// Enumerates every tile in the grid covering a bounding box at one zoom level.
///
/// The tile containing the northwest corner (`max_lat`, `min_lng`) is the
/// minimum-x/minimum-y corner of the grid (y grows southward); the tile
/// containing the southeast corner (`min_lat`, `max_lng`) is the
/// maximum-x/maximum-y corner. The full inclusive rectangle between them is
/// returned, so the cover is dense and gap-free (it may overshoot slightly at
/// the box edges).
///
/// Boxes that are inverted, wrap the antimeridian, or extend past the Web
/// Mercator envelope are rejected rather than silently producing an empty or
/// malformed set.
pub fn tiles_in_bounding_box(bbox: &BoundingBox, zoom: u8) -> Result<Vec<TileCoord>, CoordError> {
    if bbox.min_lat > bbox.max_lat {
        return Err(CoordError::InvalidBoundingBox(format!(
            "min_lat {} exceeds max_lat {}",
            bbox.min_lat, bbox.max_lat
        )));
    }
    if bbox.min_lng > bbox.max_lng {
        return Err(CoordError::InvalidBoundingBox(format!(
            "min_lng {} exceeds max_lng {} (antimeridian-crossing boxes are not supported)",
            bbox.min_lng, bbox.max_lng
        )));
    }

    let nw = to_tile_coords(bbox.max_lat, bbox.min_lng, zoom)?;
    let se = to_tile_coords(bbox.min_lat, bbox.max_lng, zoom)?;

    let mut tiles = Vec::with_capacity(
        ((se.x - nw.x + 1) as usize).saturating_mul((se.y - nw.y + 1) as usize),
    );
    for y in nw.y..=se.y {
        for x in nw.x..=se.x {
            tiles.push(TileCoord { x, y, zoom });
        }
    }

    Ok(tiles)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_york_city_at_zoom_16() {
        // New York City: 40.7128°N, 74.0060°W
        let result = to_tile_coords(40.7128, -74.0060, 16);
        assert!(result.is_ok(), "Valid coordinates should not error");

        let tile = result.unwrap();
        assert_eq!(tile.x, 19295);
        assert_eq!(tile.y, 24640);
        assert_eq!(tile.zoom, 16);
    }

    #[test]
    fn test_invalid_latitude() {
        let result = to_tile_coords(90.0, 0.0, 10);
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), CoordError::InvalidLatitude(_)));
    }

    #[test]
    fn test_invalid_longitude() {
        let result = to_tile_coords(0.0, 181.0, 10);
        assert!(matches!(
            result.unwrap_err(),
            CoordError::InvalidLongitude(_)
        ));
    }

    #[test]
    fn test_invalid_zoom() {
        let result = to_tile_coords(0.0, 0.0, 21);
        assert!(matches!(result.unwrap_err(), CoordError::InvalidZoom(21)));
    }

    #[test]
    fn test_tile_indices_stay_in_range() {
        // x and y must be in [0, 2^zoom) across the full valid domain
        let lats = [-84.9, -60.0, -0.0001, 0.0, 45.5, 84.9];
        let lngs = [-180.0, -122.7, 0.0, 13.4, 179.9999, 180.0];

        for zoom in [0u8, 1, 5, 10, 15, 20] {
            let n = 2u32.pow(zoom as u32);
            for &lat in &lats {
                for &lng in &lngs {
                    let tile = to_tile_coords(lat, lng, zoom).unwrap();
                    assert!(
                        tile.x < n,
                        "x {} out of range at zoom {} for ({}, {})",
                        tile.x,
                        zoom,
                        lat,
                        lng
                    );
                    assert!(
                        tile.y < n,
                        "y {} out of range at zoom {} for ({}, {})",
                        tile.y,
                        zoom,
                        lat,
                        lng
                    );
                }
            }
        }
    }

    #[test]
    fn test_roundtrip_conversion() {
        let original_lat = 40.7128;
        let original_lng = -74.0060;
        let zoom = 16;

        let tile = to_tile_coords(original_lat, original_lng, zoom).unwrap();
        let corner = tile_to_lat_lng(&tile);

        // Corner is within one tile of the original point
        assert!(
            (corner.lat - original_lat).abs() < 0.01,
            "Latitude should roundtrip within 0.01 degrees"
        );
        assert!(
            (corner.lng - original_lng).abs() < 0.01,
            "Longitude should roundtrip within 0.01 degrees"
        );
    }

    #[test]
    fn test_display_is_z_x_y() {
        let tile = TileCoord {
            x: 19295,
            y: 24640,
            zoom: 16,
        };
        assert_eq!(tile.to_string(), "16/19295/24640");
    }

    #[test]
    fn test_bounding_box_cover_is_dense() {
        // A 1°×1° box at zoom 10 covers a small rectangular grid
        let bbox = BoundingBox::new(45.0, -123.0, 46.0, -122.0);
        let tiles = tiles_in_bounding_box(&bbox, 10).unwrap();

        let nw = to_tile_coords(46.0, -123.0, 10).unwrap();
        let se = to_tile_coords(45.0, -122.0, 10).unwrap();

        let width = (se.x - nw.x + 1) as usize;
        let height = (se.y - nw.y + 1) as usize;
        assert_eq!(tiles.len(), width * height);

        // Every cell of the inclusive rectangle is present exactly once
        for y in nw.y..=se.y {
            for x in nw.x..=se.x {
                let count = tiles
                    .iter()
                    .filter(|t| t.x == x && t.y == y && t.zoom == 10)
                    .count();
                assert_eq!(count, 1, "tile {}/{} missing or duplicated", x, y);
            }
        }
    }

    #[test]
    fn test_bounding_box_single_tile() {
        // A box entirely inside one tile yields exactly that tile
        let bbox = BoundingBox::new(45.001, -122.999, 45.002, -122.998);
        let tiles = tiles_in_bounding_box(&bbox, 10).unwrap();
        assert_eq!(tiles.len(), 1);
        assert_eq!(tiles[0], to_tile_coords(45.001, -122.999, 10).unwrap());
    }

    #[test]
    fn test_bounding_box_rejects_antimeridian_crossing() {
        // Fiji-style box wrapping the antimeridian
        let bbox = BoundingBox::new(-19.0, 177.0, -16.0, -178.0);
        let result = tiles_in_bounding_box(&bbox, 8);
        assert!(matches!(
            result.unwrap_err(),
            CoordError::InvalidBoundingBox(_)
        ));
    }

    #[test]
    fn test_bounding_box_rejects_inverted_latitude() {
        let bbox = BoundingBox::new(46.0, -123.0, 45.0, -122.0);
        let result = tiles_in_bounding_box(&bbox, 8);
        assert!(matches!(
            result.unwrap_err(),
            CoordError::InvalidBoundingBox(_)
        ));
    }

    #[test]
    fn test_bounding_box_rejects_pole_adjacent() {
        let bbox = BoundingBox::new(84.0, -10.0, 89.0, 10.0);
        let result = tiles_in_bounding_box(&bbox, 8);
        assert!(matches!(result.unwrap_err(), CoordError::InvalidLatitude(_)));
    }

    #[test]
    fn test_enclosing_box() {
        let points = [
            Coordinate::new(45.0, -122.0),
            Coordinate::new(45.5, -123.0),
            Coordinate::new(44.8, -122.5),
        ];
        let bbox = BoundingBox::enclosing(&points).unwrap();
        assert_eq!(bbox.min_lat, 44.8);
        assert_eq!(bbox.max_lat, 45.5);
        assert_eq!(bbox.min_lng, -123.0);
        assert_eq!(bbox.max_lng, -122.0);

        assert!(BoundingBox::enclosing(&[]).is_none());
    }

    #[test]
    fn test_clamped_box() {
        let bbox = BoundingBox::new(80.0, -190.0, 89.0, 10.0).clamped();
        assert_eq!(bbox.max_lat, MAX_LAT);
        assert_eq!(bbox.min_lng, MIN_LNG);
        assert_eq!(bbox.min_lat, 80.0);
        assert_eq!(bbox.max_lng, 10.0);
    }
}
