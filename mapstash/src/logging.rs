//! Logging infrastructure for mapstash binaries.
//!
//! The library itself only emits `tracing` events; binaries call
//! [`init_logging`] once at startup to get console output, filtered via the
//! `RUST_LOG` environment variable.

use tracing_subscriber::EnvFilter;

/// Initialize console logging.
///
/// Honors `RUST_LOG`; defaults to `info` when unset. Safe to call exactly
/// once per process.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
