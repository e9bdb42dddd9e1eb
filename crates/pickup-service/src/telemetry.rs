//! Tracing subscriber setup.

use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::config::LogConfig;

/// Installs the global fmt subscriber.
///
/// An unparsable filter falls back to `info`. Returns `false` if a global
/// subscriber was already installed (tests, embedding).
pub fn init_tracing(config: &LogConfig) -> bool {
    let (filter, rejected) = match EnvFilter::try_new(&config.filter) {
        Ok(filter) => (filter, false),
        Err(_) => (EnvFilter::new("info"), true),
    };

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .try_init()
        .is_ok();

    if installed && rejected {
        warn!(filter = %config.filter, "Invalid log filter, using info");
    }
    installed
}
