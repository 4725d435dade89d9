//! Tracing initialization.
//!
//! Controlled by `SPRIG_LOG` (an `EnvFilter` directive string):
//! - unset → warnings only
//! - e.g. `SPRIG_LOG=sprig=debug` → full trace of the merge pipeline
//!
//! Diagnostics go to stderr so they never interleave with the interactive
//! prompt stream on stdout.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Call once, before any prompting.
pub fn init() {
    let filter = EnvFilter::try_from_env("SPRIG_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
