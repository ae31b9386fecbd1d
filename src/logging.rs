//! Logging configuration for athena-query.
//!
//! Logs go to stderr so stdout carries only query results.

use tracing_subscriber::EnvFilter;

/// Returns the filter directive used when `RUST_LOG` is not set.
pub fn default_directive(debug: bool) -> &'static str {
    if debug {
        "debug"
    } else {
        "info"
    }
}

/// Initializes logging to stderr.
///
/// `RUST_LOG` takes precedence; otherwise `--debug` selects debug level.
pub fn init_logging(debug: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_directive(debug))),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
