//! Process-wide log setup for binaries and tests embedding `entrust-*`.
//!
//! The library crates only emit `tracing` events; nothing is printed until a
//! subscriber is installed here.

pub mod tracing;

/// Install the JSON subscriber, filtered by `RUST_LOG` (default `info`).
///
/// Subsequent calls are no-ops.
pub fn init() {
    tracing::init();
}

/// Install the JSON subscriber with an explicit filter directive,
/// e.g. `"entrust_auth=debug"`. A directive that doesn't parse is returned
/// as an error and no subscriber is installed.
pub fn init_with_filter(directive: &str) -> Result<(), tracing_subscriber::filter::ParseError> {
    tracing::init_with_filter(directive)
}
