//! Diagnostic logging to stderr.
//!
//! Library crates log through the `log` facade; the subscriber installed
//! here forwards those records. `RUST_LOG` overrides the default filter.

use tracing_subscriber::EnvFilter;

/// Install the stderr subscriber. Default filter is `warn`, or `debug`
/// with `--verbose`. Safe to call more than once.
pub fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .compact()
        .try_init();
}
