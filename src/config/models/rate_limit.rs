//! Rate limiting configuration

use serde::{Deserialize, Serialize};

/// Token bucket configuration
///
/// `burst_allowance` is the bucket capacity, refilled continuously at
/// `requests_per_minute / 60` tokens per second.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RateLimitConfig {
    /// Enable rate limiting
    #[serde(default = "super::default_true")]
    pub enabled: bool,
    /// Sustained requests per minute
    #[serde(default = "default_rpm")]
    pub requests_per_minute: u32,
    /// Bucket capacity (must not exceed `requests_per_minute / 2`)
    #[serde(default = "default_burst")]
    pub burst_allowance: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_minute: default_rpm(),
            burst_allowance: default_burst(),
        }
    }
}

impl RateLimitConfig {
    /// Create an enabled configuration
    pub fn new(requests_per_minute: u32, burst_allowance: u32) -> Self {
        Self {
            enabled: true,
            requests_per_minute,
            burst_allowance,
        }
    }

    /// Tokens added per second
    pub fn refill_rate(&self) -> f64 {
        f64::from(self.requests_per_minute) / 60.0
    }
}

fn default_rpm() -> u32 {
    100
}

fn default_burst() -> u32 {
    10
}
