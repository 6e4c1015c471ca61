//! Logging setup for the sct-docker binary
//!
//! Build output from docker streams straight to the terminal, so our own
//! events go to stderr and stay terse: no targets, no line numbers.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

/// Filter used when `RUST_LOG` is unset
///
/// `level` applies to this crate; everything else is held at `warn`. An
/// unrecognised level falls back to `info`.
pub fn default_filter(level: &str) -> EnvFilter {
    let level = level.parse::<LevelFilter>().unwrap_or(LevelFilter::INFO);
    EnvFilter::new(format!("warn,sct_docker={level}"))
}

/// Installs the global subscriber
///
/// `RUST_LOG` takes precedence over `level`. Returns false if a subscriber
/// was already installed, in which case the existing one is kept.
pub fn init_logging(level: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}
