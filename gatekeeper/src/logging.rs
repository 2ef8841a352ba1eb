//! Ambient logging setup: a `tracing-subscriber` `fmt` layer filtered by
//! `RUST_LOG` (falling back to the configured default directive), with the
//! `log` facade bridged in so the dependency crates' `log::info!`/`warn!`
//! calls are captured the same way.

use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. Must run once, before any other code logs.
///
/// # Panics
/// Panics if a global logger or subscriber has already been installed.
pub fn init(default_filter: &str) {
    tracing_log::LogTracer::init().expect("failed to bridge the log facade into tracing");

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();
}
