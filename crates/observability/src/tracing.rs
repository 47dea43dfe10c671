//! JSON tracing subscriber.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::ParseError;

const DEFAULT_DIRECTIVE: &str = "info";

pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));
    install(filter);
}

/// Nothing is installed when `directive` doesn't parse.
pub fn init_with_filter(directive: &str) -> Result<(), ParseError> {
    install(EnvFilter::try_new(directive)?);
    Ok(())
}

fn install(filter: EnvFilter) {
    // Cache hits and misses are logged per key; keep records compact.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(true)
        .with_current_span(false)
        .try_init();
}
