//! Diagnostic output for the `vizion` binary.
//!
//! Library code only emits `tracing` events. Installing a subscriber is left to
//! the binary, which calls [`initialize`] once at startup.

use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVE: &str = "warn";

/// Install the global subscriber, writing to stderr.
///
/// `level` takes precedence over `RUST_LOG`. Calling this more than once is
/// harmless: later calls leave the installed subscriber in place.
pub fn initialize(level: Option<&str>) {
    let filter = filter_for(level);
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn filter_for(level: Option<&str>) -> EnvFilter {
    match level {
        Some(directive) => EnvFilter::try_new(directive)
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE)),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE)),
    }
}
