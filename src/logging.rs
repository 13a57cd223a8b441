//! Logging setup for applications embedding the inference loop
//!
//! The library only emits `tracing` events: per-round progress at info,
//! regressions at warn, checkpoint traffic at debug. Nothing is printed until
//! the application installs a subscriber, for example with [`init_logging`].

use tracing::debug;

/// Filter directive for a verbosity level
pub fn log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Install a formatting subscriber. Returns `false` when a global subscriber
/// was already installed, in which case the existing one is kept.
pub fn init_logging(verbose: u8) -> bool {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(log_level(verbose))
        .with_target(verbose >= 2)
        .with_line_number(verbose >= 2)
        .try_init()
        .is_ok();

    if installed {
        debug!("Logging initialized with verbosity level: {}", verbose);
    }
    installed
}
