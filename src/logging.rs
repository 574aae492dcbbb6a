//! Diagnostic tracing for the learning loop.
//!
//! User-facing progress goes to stdout through the command layer. This module
//! only wires `tracing` events (attempt numbers, stages, error kinds) to stderr,
//! filtered by `RUST_LOG`.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG`. Defaults to `warn`, or `relearn=debug` when `verbose` is set.
///
/// ```bash
/// RUST_LOG=relearn=info relearn run "Fix the bug"
/// ```
pub fn init(verbose: bool) {
    let default = if verbose { "relearn=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // try_init so repeated initialization (tests, embedding) is harmless
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init();
}
