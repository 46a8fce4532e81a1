//! Tracing setup: structured logging with span definitions and event helpers.

pub mod events;
pub mod spans;

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directive.
pub const LOG_ENV_VAR: &str = "GRIMOIRE_LOG";

fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Human-readable output filtered by `GRIMOIRE_LOG`, defaulting to `info`.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter("info"))
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}

/// JSON lines output, for log shipping.
pub fn init_tracing_json() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter("info"))
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .json()
        .try_init();
}

/// Explicit filter string, ignoring the environment (for tests or embedding).
pub fn init_tracing_with_filter(filter: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(true)
        .with_test_writer()
        .try_init();
}

/// Install a subscriber from the observability config section.
pub fn init_from_config(config: &grimoire_core::config::ObservabilityConfig) {
    if config.json_logs {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter(&config.log_level))
            .with_target(true)
            .with_writer(std::io::stderr)
            .json()
            .try_init();
    } else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter(&config.log_level))
            .with_target(true)
            .with_writer(std::io::stderr)
            .try_init();
    }
}
