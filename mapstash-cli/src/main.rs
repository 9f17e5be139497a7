//! mapstash command line interface.
//!
//! Thin wrapper over the `mapstash` engine: prefetch an area, inspect cache
//! statistics, reclaim space, or clear the cache entirely.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use mapstash::config::CacheConfig;
use mapstash::logging::init_logging;
use mapstash::service::MapCacheService;

#[derive(Parser)]
#[command(name = "mapstash", version = mapstash::VERSION, about = "Offline map tile cache")]
struct Cli {
    /// Directory for cached tile files
    #[arg(long, default_value = "mapstash/tiles", global = true)]
    cache_dir: PathBuf,

    /// Directory for the cache index
    #[arg(long, default_value = "mapstash/state", global = true)]
    state_dir: PathBuf,

    /// Cache size ceiling in megabytes
    #[arg(long, global = true)]
    max_mb: Option<u64>,

    /// Tile time-to-live in days
    #[arg(long, global = true)]
    ttl_days: Option<u32>,

    /// Tile endpoint template with {z}/{x}/{y} placeholders
    #[arg(long, global = true)]
    url_template: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Download every tile covering an area around a point
    Prefetch {
        /// Center latitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Center longitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,

        /// Radius around the center in kilometres
        #[arg(long, default_value_t = 2.0)]
        radius_km: f64,

        /// Zoom levels to download (defaults to the configured set)
        #[arg(long)]
        zoom: Vec<u8>,
    },

    /// Show cache statistics
    Stats,

    /// Run an eviction pass
    Evict,

    /// Delete every cached tile and the index
    Clear,
}

impl Cli {
    fn config(&self) -> CacheConfig {
        let mut config = CacheConfig::default()
            .with_cache_dir(&self.cache_dir)
            .with_state_dir(&self.state_dir);
        if let Some(mb) = self.max_mb {
            config = config.with_max_cache_mb(mb);
        }
        if let Some(days) = self.ttl_days {
            config = config.with_tile_ttl_days(days);
        }
        if let Some(ref template) = self.url_template {
            config = config.with_url_template(template.clone());
        }
        config
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    let cli = Cli::parse();
    let service = match MapCacheService::new(cli.config()) {
        Ok(service) => service,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Command::Prefetch {
            lat,
            lng,
            radius_km,
            ref zoom,
        } => commands::prefetch(&service, lat, lng, radius_km, zoom).await,
        Command::Stats => commands::stats(&service).await,
        Command::Evict => commands::evict(&service).await,
        Command::Clear => commands::clear(&service).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
