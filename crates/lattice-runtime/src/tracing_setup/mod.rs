//! Structured JSON logging for every lattice crate.

pub mod spans;

use std::sync::Once;

use tracing_subscriber::EnvFilter;

use lattice_core::config::defaults::DEFAULT_LOG_LEVEL;

/// Environment variable holding the filter directives.
pub const LOG_ENV: &str = "LATTICE_LOG";

static INIT: Once = Once::new();

/// Install the JSON subscriber, filtered by `LATTICE_LOG` or `info`.
///
/// Idempotent. If the host already installed a global subscriber, that one
/// stays in place.
pub fn init_tracing() {
    init_tracing_with_default(DEFAULT_LOG_LEVEL);
}

/// Like [`init_tracing`], with `default_filter` used when `LATTICE_LOG` is
/// unset or unparsable.
pub fn init_tracing_with_default(default_filter: &str) {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_filter));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .json()
            .try_init();
    });
}
