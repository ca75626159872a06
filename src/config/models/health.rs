//! Health cache configuration

use crate::utils::serde_helpers::duration_secs_f64;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Health probe cache configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthCacheConfig {
    /// How long a probe result stays valid
    #[serde(default = "default_cache_interval", with = "duration_secs_f64")]
    pub cache_interval: Duration,
    /// Upper bound for a single live probe; a timed out probe counts as unhealthy
    #[serde(default = "default_probe_timeout", with = "duration_secs_f64")]
    pub probe_timeout: Duration,
}

impl Default for HealthCacheConfig {
    fn default() -> Self {
        Self {
            cache_interval: default_cache_interval(),
            probe_timeout: default_probe_timeout(),
        }
    }
}

fn default_cache_interval() -> Duration {
    Duration::from_secs(60)
}

fn default_probe_timeout() -> Duration {
    Duration::from_secs(10)
}
