//! Top-level dispatcher configuration

use super::*;
use crate::core::backend::BackendDescriptor;
use crate::core::router::strategy::SelectionStrategy;
use crate::utils::serde_helpers::duration_secs_f64;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Deployment environment, selecting a preset of reliability settings
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(format!("Unknown environment: {}", other)),
        }
    }
}

/// Dispatcher configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DispatcherConfig {
    #[serde(default)]
    pub environment: Environment,
    /// Strategy used when a caller does not name one
    #[serde(default)]
    pub default_strategy: SelectionStrategy,
    #[serde(default)]
    pub circuit_breaker: CircuitBreakerConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    /// Admission bucket applied to every selection
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Optional bucket per backend; a denied backend is skipped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend_rate_limit: Option<RateLimitConfig>,
    #[serde(default)]
    pub health: HealthCacheConfig,
    #[serde(default)]
    pub selector: SelectorConfig,
    /// Concurrent recognize calls admitted by the bulkhead
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,
    /// Default deadline for a recognize call
    #[serde(default = "default_request_timeout", with = "duration_secs_f64")]
    pub request_timeout: Duration,
    /// Candidates tried after the first one fails
    #[serde(default = "default_max_fallbacks")]
    pub max_fallbacks: usize,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Static backend descriptors (reference metadata)
    #[serde(default)]
    pub backends: Vec<BackendDescriptor>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            default_strategy: SelectionStrategy::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
            retry: RetryConfig::default(),
            rate_limit: RateLimitConfig::default(),
            backend_rate_limit: None,
            health: HealthCacheConfig::default(),
            selector: SelectorConfig::default(),
            max_concurrent_requests: default_max_concurrent_requests(),
            request_timeout: default_request_timeout(),
            max_fallbacks: default_max_fallbacks(),
            logging: LoggingConfig::default(),
            backends: Vec::new(),
        }
    }
}

impl DispatcherConfig {
    /// Preset tuned for an environment
    pub fn for_environment(environment: Environment) -> Self {
        let mut config = Self {
            environment,
            ..Self::default()
        };

        match environment {
            Environment::Development => {
                config.circuit_breaker.failure_threshold = 2;
                config.circuit_breaker.recovery_timeout = Duration::from_secs(30);
                config.retry.max_attempts = 2;
                config.rate_limit.requests_per_minute = 30;
                config.logging.level = "debug".to_string();
            }
            Environment::Production => {
                config.circuit_breaker.failure_threshold = 5;
                config.circuit_breaker.recovery_timeout = Duration::from_secs(300);
                config.retry.max_attempts = 3;
                config.rate_limit.requests_per_minute = 100;
                config.max_concurrent_requests = 20;
                config.logging.json = true;
            }
        }

        config
    }

    /// Look up a configured backend descriptor by name
    pub fn backend(&self, name: &str) -> Option<&BackendDescriptor> {
        self.backends.iter().find(|b| b.name == name)
    }
}

fn default_max_concurrent_requests() -> usize {
    10
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_max_fallbacks() -> usize {
    5
}
