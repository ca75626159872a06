//! Reliability and selection configuration validators
//!
//! Validation implementations for CircuitBreakerConfig, RetryConfig,
//! RateLimitConfig, HealthCacheConfig and SelectorConfig.

use super::trait_def::Validate;
use crate::config::models::*;
use std::time::Duration;

/// Shortest recovery timeout accepted from configuration
pub const MIN_RECOVERY_TIMEOUT: Duration = Duration::from_secs(10);

impl Validate for CircuitBreakerConfig {
    fn validate(&self) -> Result<(), String> {
        if self.failure_threshold == 0 {
            return Err("Circuit breaker failure threshold must be greater than 0".to_string());
        }

        if self.recovery_timeout < MIN_RECOVERY_TIMEOUT {
            return Err(format!(
                "Circuit breaker recovery timeout must be at least {}s",
                MIN_RECOVERY_TIMEOUT.as_secs()
            ));
        }

        if self.half_open_max_calls == 0 {
            return Err("Circuit breaker half-open max calls must be greater than 0".to_string());
        }

        if self.success_threshold == 0 {
            return Err("Circuit breaker success threshold must be greater than 0".to_string());
        }

        if self.success_threshold > self.half_open_max_calls {
            return Err(
                "Circuit breaker success threshold cannot exceed half-open max calls".to_string(),
            );
        }

        Ok(())
    }
}

impl Validate for RetryConfig {
    fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("Retry max attempts must be greater than 0".to_string());
        }

        if self.base_delay.is_zero() {
            return Err("Retry base delay must be greater than 0".to_string());
        }

        if self.max_delay <= self.base_delay {
            return Err("Retry max delay must be greater than base delay".to_string());
        }

        if !(self.exponential_base > 1.0) {
            return Err("Retry exponential base must be greater than 1.0".to_string());
        }

        if !(0.0..=1.0).contains(&self.jitter_ratio) {
            return Err("Retry jitter ratio must be between 0.0 and 1.0".to_string());
        }

        Ok(())
    }
}

impl Validate for RateLimitConfig {
    fn validate(&self) -> Result<(), String> {
        if self.requests_per_minute == 0 {
            return Err("Rate limit requests per minute must be greater than 0".to_string());
        }

        if self.burst_allowance == 0 {
            return Err("Rate limit burst allowance must be greater than 0".to_string());
        }

        if f64::from(self.burst_allowance) > f64::from(self.requests_per_minute) / 2.0 {
            return Err(
                "Rate limit burst allowance cannot exceed half of requests per minute".to_string(),
            );
        }

        Ok(())
    }
}

impl Validate for HealthCacheConfig {
    fn validate(&self) -> Result<(), String> {
        if self.cache_interval.is_zero() {
            return Err("Health cache interval must be greater than 0".to_string());
        }

        if self.probe_timeout.is_zero() {
            return Err("Health probe timeout must be greater than 0".to_string());
        }

        Ok(())
    }
}

impl Validate for SelectorConfig {
    fn validate(&self) -> Result<(), String> {
        let w = &self.balanced_weights;
        if [w.accuracy, w.cost, w.speed]
            .iter()
            .any(|v| !v.is_finite() || *v < 0.0)
        {
            return Err("Balanced weights must be finite and non-negative".to_string());
        }

        if w.total() <= 0.0 {
            return Err("Balanced weights must not all be zero".to_string());
        }

        let a = &self.adaptive;
        if a.time_penalty_scale <= 0.0 {
            return Err("Adaptive time penalty scale must be greater than 0".to_string());
        }

        if a.base_weight < 0.0 || a.performance_weight < 0.0 || a.max_time_penalty < 0.0 {
            return Err("Adaptive tuning values must be non-negative".to_string());
        }

        if self.stats_window == 0 {
            return Err("Selector stats window must be greater than 0".to_string());
        }

        Ok(())
    }
}
