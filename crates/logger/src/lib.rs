//! Shared `tracing` setup for the parser binaries.
//!
//! Libraries in this workspace only emit events; binaries call [`init`] once
//! at startup. Output goes to stderr so stdout stays free for JSON.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info";

/// Installs a fmt subscriber filtered by `RUST_LOG`, or `info` when unset.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());
    install(filter);
}

/// Like [`init`], but an explicit level (e.g. from a `--log-level` flag) wins over `RUST_LOG`.
pub fn init_with_level(level: Option<&str>) {
    match level {
        Some(level) => install(EnvFilter::new(level)),
        None => init(),
    }
}

fn install(filter: EnvFilter) {
    // A second call in the same process (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
