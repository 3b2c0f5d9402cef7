//! Tracing setup for the binary.

use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// The `CLIRIG_LOG` environment variable takes precedence over `verbose`;
/// without it, `verbose` selects debug over info. Logs go to stderr so they
/// never mix with the child's forwarded stdout.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env("CLIRIG_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
