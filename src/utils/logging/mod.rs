//! Logging utilities
//!
//! Structured logging setup for binaries and tests that embed the gateway.
//! The library itself only emits `tracing` events; installing a subscriber
//! is the embedder's choice.

use tracing_subscriber::EnvFilter;

/// Initialize a `tracing` subscriber driven by `RUST_LOG`.
///
/// Falls back to `info` when `RUST_LOG` is unset. Safe to call more than
/// once; subsequent calls are no-ops.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
