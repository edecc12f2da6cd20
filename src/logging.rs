//! Logging setup using `tracing` and `tracing-subscriber`.
//!
//! Logs go to stderr so command output on stdout stays clean. `RUST_LOG`
//! takes precedence; otherwise the level comes from the `-v` count:
//!
//! - 0: `info`
//! - 1 (`-v`): `debug`
//! - 2+ (`-vv`): `trace`

use tracing::Level;
use tracing_subscriber::EnvFilter;

pub fn level_for_verbosity(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Installs the global subscriber. Safe to call more than once; later calls are no-ops.
pub fn init_logging(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(level_for_verbosity(verbosity).as_str().to_ascii_lowercase())
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
