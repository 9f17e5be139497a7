//! Subcommand implementations.

use std::io::Write;

use mapstash::cache::CacheError;
use mapstash::kv::FileKvStore;
use mapstash::provider::AsyncReqwestClient;
use mapstash::service::MapCacheService;

type Service = MapCacheService<FileKvStore, AsyncReqwestClient>;

/// Prefetch an area, printing a progress line as the batch advances.
pub async fn prefetch(
    service: &Service,
    lat: f64,
    lng: f64,
    radius_km: f64,
    zoom: &[u8],
) -> Result<(), CacheError> {
    let zoom_levels = if zoom.is_empty() { None } else { Some(zoom) };

    let summary = service
        .download_area_tiles(lat, lng, radius_km, zoom_levels, |progress| {
            print!(
                "\r{}/{} tiles ({}%)",
                progress.downloaded, progress.total, progress.percentage
            );
            let _ = std::io::stdout().flush();
        })
        .await?;
    println!();

    println!(
        "{} downloaded, {} failed, {} already cached",
        summary.success, summary.failed, summary.skipped
    );
    Ok(())
}

/// Print cache statistics.
pub async fn stats(service: &Service) -> Result<(), CacheError> {
    let stats = service.get_cache_stats().await;
    println!("tiles:    {}", stats.tile_count);
    println!("size:     {:.2} MB of {} MB", stats.total_size_mb, stats.max_size_mb);
    println!("used:     {}%", stats.percent_used);
    Ok(())
}

/// Run an eviction pass and report what it freed.
pub async fn evict(service: &Service) -> Result<(), CacheError> {
    let result = service.run_eviction().await;
    println!(
        "evicted {} tiles ({:.2} MB)",
        result.evicted,
        result.bytes_freed as f64 / (1024.0 * 1024.0)
    );
    Ok(())
}

/// Delete the whole cache.
pub async fn clear(service: &Service) -> Result<(), CacheError> {
    service.clear_map_cache().await;
    println!("cache cleared");
    Ok(())
}
