//! Logging configuration

use serde::{Deserialize, Serialize};

/// Logging configuration consumed by [`crate::utils::logging::init_tracing`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Default filter directive, e.g. `info` or `vision_dispatch=debug`
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human readable output
    #[serde(default)]
    pub json: bool,
    /// Include the event target (module path)
    #[serde(default)]
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            with_target: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
