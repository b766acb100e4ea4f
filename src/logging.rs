//! Diagnostic logging.
//!
//! Logs go to stderr and never mix with program output on stdout.

use tracing_subscriber::{EnvFilter, fmt};

/// Environment variable holding the log filter, e.g. `SCREW_LOG=debug`.
pub const LOG_ENV: &str = "SCREW_LOG";

/// Initialize logging with a default filter.
///
/// The filter is read from `SCREW_LOG`, then `RUST_LOG`; the default is `warn`.
/// Calling this more than once is harmless.
pub fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
