//! Keyed registry of circuit breakers and rate limiters
//!
//! Instances are created lazily on first use and live as long as the
//! registry. Configuration is swappable at runtime; only instances created
//! after a swap see the new values.

use super::circuit_breaker::CircuitBreaker;
use super::rate_limiter::RateLimiter;
use super::retry::RetryHandler;
use super::types::{CircuitBreakerSnapshot, RateLimiterStatus};
use crate::config::models::{CircuitBreakerConfig, RateLimitConfig, RetryConfig};
use arc_swap::ArcSwap;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Prefix for per-backend recognition buckets
pub const BACKEND_BUCKET_PREFIX: &str = "recognize:";

/// Per-backend reliability state owned by a dispatcher
#[derive(Debug)]
pub struct ReliabilityRegistry {
    circuit_breakers: DashMap<String, Arc<CircuitBreaker>>,
    rate_limiters: DashMap<String, Arc<RateLimiter>>,
    circuit_breaker_config: ArcSwap<CircuitBreakerConfig>,
    retry_config: ArcSwap<RetryConfig>,
    rate_limit_config: ArcSwap<RateLimitConfig>,
    backend_rate_limit: Option<RateLimitConfig>,
}

impl ReliabilityRegistry {
    pub fn new(
        circuit_breaker: CircuitBreakerConfig,
        retry: RetryConfig,
        rate_limit: RateLimitConfig,
        backend_rate_limit: Option<RateLimitConfig>,
    ) -> Self {
        Self {
            circuit_breakers: DashMap::new(),
            rate_limiters: DashMap::new(),
            circuit_breaker_config: ArcSwap::from_pointee(circuit_breaker),
            retry_config: ArcSwap::from_pointee(retry),
            rate_limit_config: ArcSwap::from_pointee(rate_limit),
            backend_rate_limit,
        }
    }

    /// Get or create the breaker guarding `name`
    pub fn circuit_breaker(&self, name: &str) -> Arc<CircuitBreaker> {
        if let Some(cb) = self.circuit_breakers.get(name) {
            return cb.value().clone();
        }

        self.circuit_breakers
            .entry(name.to_string())
            .or_insert_with(|| {
                debug!(backend = %name, "Creating circuit breaker");
                Arc::new(CircuitBreaker::new(
                    name,
                    self.circuit_breaker_config.load().as_ref().clone(),
                ))
            })
            .value()
            .clone()
    }

    /// Get or create the admission bucket for `service`
    pub fn rate_limiter(&self, service: &str) -> Arc<RateLimiter> {
        self.limiter_with(service, || self.rate_limit_config.load().as_ref().clone())
    }

    /// Per-backend bucket, when backend rate limiting is configured
    pub fn backend_rate_limiter(&self, backend: &str) -> Option<Arc<RateLimiter>> {
        let config = self.backend_rate_limit.as_ref()?;
        let service = format!("{}{}", BACKEND_BUCKET_PREFIX, backend);
        Some(self.limiter_with(&service, || config.clone()))
    }

    fn limiter_with<F>(&self, service: &str, config: F) -> Arc<RateLimiter>
    where
        F: FnOnce() -> RateLimitConfig,
    {
        if let Some(limiter) = self.rate_limiters.get(service) {
            return limiter.value().clone();
        }

        self.rate_limiters
            .entry(service.to_string())
            .or_insert_with(|| {
                debug!(service = %service, "Creating rate limiter");
                Arc::new(RateLimiter::new(service, config()))
            })
            .value()
            .clone()
    }

    /// A retry handler over the current retry configuration
    pub fn retry_handler(&self) -> RetryHandler {
        RetryHandler::new(self.retry_config.load().as_ref().clone())
    }

    pub fn circuit_breaker_config(&self) -> Arc<CircuitBreakerConfig> {
        self.circuit_breaker_config.load_full()
    }

    pub fn retry_config(&self) -> Arc<RetryConfig> {
        self.retry_config.load_full()
    }

    pub fn rate_limit_config(&self) -> Arc<RateLimitConfig> {
        self.rate_limit_config.load_full()
    }

    pub fn set_circuit_breaker_config(&self, config: CircuitBreakerConfig) {
        self.circuit_breaker_config.store(Arc::new(config));
    }

    pub fn set_retry_config(&self, config: RetryConfig) {
        self.retry_config.store(Arc::new(config));
    }

    pub fn set_rate_limit_config(&self, config: RateLimitConfig) {
        self.rate_limit_config.store(Arc::new(config));
    }

    pub fn circuit_breaker_snapshots(&self) -> BTreeMap<String, CircuitBreakerSnapshot> {
        self.circuit_breakers
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().snapshot()))
            .collect()
    }

    pub fn rate_limiter_statuses(&self) -> BTreeMap<String, RateLimiterStatus> {
        self.rate_limiters
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().status()))
            .collect()
    }
}
