//! Global subscriber installation.

use tracing_subscriber::EnvFilter;

use crate::{LogConfig, LogFormat};

/// Install the process-wide subscriber.
///
/// Safe to call multiple times; only the first call installs anything.
/// Returns whether this call installed the subscriber.
pub fn init(config: &LogConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    let installed = match config.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_timer(tracing_subscriber::fmt::time::SystemTime)
            .with_target(false)
            .try_init()
            .is_ok(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
            .is_ok(),
    };

    if installed {
        tracing::debug!(format = %config.format, "logging initialized");
    }
    installed
}
