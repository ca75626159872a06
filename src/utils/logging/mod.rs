//! Logging utilities
//!
//! The library only emits `tracing` events; binaries call [`init_tracing`]
//! once at startup to install a subscriber.

use crate::config::models::LoggingConfig;
use crate::utils::error::{DispatchError, Result};
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber
///
/// `RUST_LOG` takes precedence over the configured level. Fails if a
/// global subscriber has already been installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| DispatchError::Config(format!("Invalid log level '{}': {}", config.level, e)))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.with_target)
        .with_thread_ids(false);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|e| DispatchError::Internal(format!("Failed to install tracing subscriber: {}", e)))
}
