//! Dispatcher observability snapshot

use super::Dispatcher;
use crate::config::models::{CircuitBreakerConfig, RateLimitConfig, RetryConfig};
use crate::core::health::HealthCacheStatus;
use crate::core::monitoring::RequestMonitorStatus;
use crate::core::reliability::{CircuitBreakerSnapshot, RateLimiterStatus};
use crate::core::router::{LoadBalancerStatus, SelectorInfo};
use serde::Serialize;
use std::collections::BTreeMap;

/// Circuit breakers and rate limiters created so far
#[derive(Debug, Clone, Serialize)]
pub struct ReliabilityStatus {
    pub circuit_breakers: BTreeMap<String, CircuitBreakerSnapshot>,
    pub rate_limiters: BTreeMap<String, RateLimiterStatus>,
}

/// Reliability configuration currently applied to new instances
#[derive(Debug, Clone, Serialize)]
pub struct ConfigSnapshot {
    pub circuit_breaker: CircuitBreakerConfig,
    pub retry: RetryConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ConcurrencyStatus {
    pub max_concurrent_requests: usize,
    pub available_permits: usize,
}

/// Full dispatcher status
#[derive(Debug, Clone, Serialize)]
pub struct DispatcherStatus {
    pub selector: SelectorInfo,
    pub reliability: ReliabilityStatus,
    pub load_balancer: LoadBalancerStatus,
    pub health_cache: HealthCacheStatus,
    pub requests: RequestMonitorStatus,
    pub concurrency: ConcurrencyStatus,
    pub configs: ConfigSnapshot,
}

impl Dispatcher {
    pub fn get_status(&self) -> DispatcherStatus {
        DispatcherStatus {
            selector: self.selector.selector_info(),
            reliability: ReliabilityStatus {
                circuit_breakers: self.registry.circuit_breaker_snapshots(),
                rate_limiters: self.registry.rate_limiter_statuses(),
            },
            load_balancer: self.load_balancer.get_status(),
            health_cache: self.health_cache.status(),
            requests: self.monitor.status(),
            concurrency: ConcurrencyStatus {
                max_concurrent_requests: self.bulkhead.max_concurrent(),
                available_permits: self.bulkhead.available_permits(),
            },
            configs: ConfigSnapshot {
                circuit_breaker: self.registry.circuit_breaker_config().as_ref().clone(),
                retry: self.registry.retry_config().as_ref().clone(),
                rate_limit: self.registry.rate_limit_config().as_ref().clone(),
            },
        }
    }
}
