//! Diagnostic tracing for the `whatexec` binary.
//!
//! Everything goes to stderr so stdout stays reserved for resolved paths.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global tracing subscriber.
///
/// Reads `RUST_LOG`; when unset the level is `warn`, or `debug` for this
/// crate when `verbose` is set. Output: stderr, compact format.
///
/// # Example
/// ```bash
/// RUST_LOG=whatexec=trace whatexec find git
/// ```
pub fn init(verbose: bool) {
    let fallback = if verbose { "warn,whatexec=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    // A second init (tests calling `run` twice) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init();
}
