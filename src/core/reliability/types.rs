//! Shared types for the reliability components

use crate::config::models::{CircuitBreakerConfig, RateLimitConfig};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Circuit breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Circuit is closed, requests flow normally
    Closed,
    /// Circuit is open, requests are rejected
    Open,
    /// Circuit is half-open, allowing probe requests
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::HalfOpen => "half_open",
        };
        f.write_str(s)
    }
}

/// Point-in-time view of a circuit breaker
#[derive(Debug, Clone, Serialize)]
pub struct CircuitBreakerSnapshot {
    pub name: String,
    pub state: CircuitState,
    pub failure_count: u32,
    /// Successful probes in the current half-open window
    pub success_count: u32,
    /// Probe slots currently taken in the half-open window
    pub half_open_calls: u32,
    /// Seconds since the circuit last opened
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opened_seconds_ago: Option<f64>,
    pub config: CircuitBreakerConfig,
}

/// Point-in-time view of a token bucket
#[derive(Debug, Clone, Serialize)]
pub struct RateLimiterStatus {
    pub service: String,
    pub enabled: bool,
    pub requests_per_minute: u32,
    pub burst_allowance: u32,
    pub available_tokens: f64,
    /// Tokens added per second
    pub refill_rate: f64,
}

impl RateLimiterStatus {
    pub(crate) fn new(service: &str, config: &RateLimitConfig, available_tokens: f64) -> Self {
        Self {
            service: service.to_string(),
            enabled: config.enabled,
            requests_per_minute: config.requests_per_minute,
            burst_allowance: config.burst_allowance,
            available_tokens,
            refill_rate: config.refill_rate(),
        }
    }
}
