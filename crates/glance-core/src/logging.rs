//! Tracing subscriber initialization.

use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// Filter resolution: `GLANCE_LOG` env var if set, otherwise the provided
/// default directive (e.g. `"info"`). Safe to call more than once; later
/// calls are no-ops.
pub fn init(default_directive: &str) {
    let filter = EnvFilter::try_from_env("GLANCE_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
