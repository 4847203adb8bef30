//! Logging initialization
//!
//! Console tracing with an env-filter override (`RUST_LOG`). Kept as a
//! helper so the binary and integration harnesses initialize identically.

use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the global tracing subscriber. Safe to call once per process;
/// later calls are ignored so tests can share it.
pub fn init_logging(default_level: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init();
}
