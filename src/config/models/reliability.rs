//! Circuit breaker and retry configuration

use crate::utils::serde_helpers::duration_secs_f64;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Circuit breaker configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures (while closed) that open the circuit
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    /// Time the circuit stays open before a probe is let through
    #[serde(default = "default_recovery_timeout", with = "duration_secs_f64")]
    pub recovery_timeout: Duration,
    /// Probe calls admitted while half-open
    #[serde(default = "default_half_open_max_calls")]
    pub half_open_max_calls: u32,
    /// Successful probes required to close the circuit again
    #[serde(default = "default_success_threshold")]
    pub success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            recovery_timeout: default_recovery_timeout(),
            half_open_max_calls: default_half_open_max_calls(),
            success_threshold: default_success_threshold(),
        }
    }
}

fn default_failure_threshold() -> u32 {
    3
}

fn default_recovery_timeout() -> Duration {
    Duration::from_secs(300)
}

fn default_half_open_max_calls() -> u32 {
    2
}

fn default_success_threshold() -> u32 {
    2
}

/// Default proportional jitter applied to backoff delays (±10%)
pub const DEFAULT_JITTER_RATIO: f64 = 0.1;

/// Retry configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetryConfig {
    /// Total attempts, including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the first retry
    #[serde(default = "default_base_delay", with = "duration_secs_f64")]
    pub base_delay: Duration,
    /// Upper bound for any single delay
    #[serde(default = "default_max_delay", with = "duration_secs_f64")]
    pub max_delay: Duration,
    /// Growth factor between consecutive delays
    #[serde(default = "default_exponential_base")]
    pub exponential_base: f64,
    /// Randomise delays to avoid synchronised retries
    #[serde(default = "super::default_true")]
    pub jitter: bool,
    /// Jitter amplitude as a fraction of the delay
    #[serde(default = "default_jitter_ratio")]
    pub jitter_ratio: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay: default_base_delay(),
            max_delay: default_max_delay(),
            exponential_base: default_exponential_base(),
            jitter: true,
            jitter_ratio: DEFAULT_JITTER_RATIO,
        }
    }
}

impl RetryConfig {
    /// Retry configuration without jitter, handy for deterministic schedules
    pub fn without_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(10)
}

fn default_exponential_base() -> f64 {
    2.0
}

fn default_jitter_ratio() -> f64 {
    DEFAULT_JITTER_RATIO
}
