//! Structured logging for simulation runs and validation batches.
//!
//! The library only emits `tracing` events; installing a subscriber is left
//! to the binary or test harness, through one of the initializers below.
//! Verbosity follows `RUST_LOG` when it is set:
//!
//! ```bash
//! RUST_LOG=qsim=debug cargo test
//! RUST_LOG=qsim::simulator=trace cargo test --test determinism
//! ```
//!
//! Level guidelines:
//! - TRACE: each dispatched event
//! - DEBUG: run start/finish, verdicts of individual hypothesis tests
//! - INFO: replication batches
//! - WARN: runs that produce no usable per-customer statistics

use tracing::info;
use tracing_subscriber::{filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging at the `info` level.
pub fn init_logging() {
    init_logging_with_level("info")
}

/// Initialize logging with a specific default level ("trace", "debug",
/// "info", "warn" or "error").  `RUST_LOG` takes precedence when set.
/// Repeated calls are ignored, so test suites may call this freely.
pub fn init_logging_with_level(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("{}={}", env!("CARGO_PKG_NAME"), level).into());

    let installed = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_test_writer(),
        )
        .with(filter)
        .try_init();

    if installed.is_ok() {
        info!("Simulation logging initialized at level: {}", level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_initialization_is_harmless() {
        init_logging_with_level("debug");
        init_logging();
    }
}
