//! Configuration management for the dispatcher
//!
//! This module handles loading, validation, and serialisation of the
//! dispatcher configuration.

pub mod models;
pub mod validation;

pub use models::*;
pub use validation::Validate;

use crate::core::router::strategy::SelectionStrategy;
use crate::utils::error::{DispatchError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

/// Prefix shared by every environment override
pub const ENV_PREFIX: &str = "VISION_DISPATCH_";

/// Main configuration struct for the dispatcher
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Dispatcher configuration
    #[serde(flatten)]
    pub dispatcher: DispatcherConfig,
}

impl Config {
    /// Load configuration from file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {:?}", path);

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| DispatchError::Config(format!("Failed to read config file: {}", e)))?;

        let config = Self::from_yaml_str(&content)?;

        debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Parse and validate configuration from a YAML document
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let dispatcher: DispatcherConfig = serde_yaml::from_str(content)
            .map_err(|e| DispatchError::Config(format!("Failed to parse config: {}", e)))?;

        let config = Self { dispatcher };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup
    ///
    /// `VISION_DISPATCH_ENVIRONMENT` selects the preset; the remaining
    /// variables override individual settings on top of it.
    pub fn from_env_with<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        info!("Loading configuration from environment variables");

        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        let environment = match var("ENVIRONMENT") {
            Some(value) => Environment::from_str(&value).map_err(DispatchError::Config)?,
            None => Environment::default(),
        };
        let mut dispatcher = DispatcherConfig::for_environment(environment);

        if let Some(value) = var("DEFAULT_STRATEGY") {
            dispatcher.default_strategy = SelectionStrategy::from_str(&value)?;
        }
        if let Some(value) = var("FAILURE_THRESHOLD") {
            dispatcher.circuit_breaker.failure_threshold = parse_var("FAILURE_THRESHOLD", &value)?;
        }
        if let Some(value) = var("RECOVERY_TIMEOUT") {
            dispatcher.circuit_breaker.recovery_timeout = parse_secs("RECOVERY_TIMEOUT", &value)?;
        }
        if let Some(value) = var("MAX_RETRIES") {
            dispatcher.retry.max_attempts = parse_var("MAX_RETRIES", &value)?;
        }
        if let Some(value) = var("RATE_LIMIT_ENABLED") {
            dispatcher.rate_limit.enabled = parse_var("RATE_LIMIT_ENABLED", &value)?;
        }
        if let Some(value) = var("REQUESTS_PER_MINUTE") {
            dispatcher.rate_limit.requests_per_minute =
                parse_var("REQUESTS_PER_MINUTE", &value)?;
        }
        if let Some(value) = var("BURST_ALLOWANCE") {
            dispatcher.rate_limit.burst_allowance = parse_var("BURST_ALLOWANCE", &value)?;
        }
        if let Some(value) = var("HEALTH_CACHE_INTERVAL") {
            dispatcher.health.cache_interval = parse_secs("HEALTH_CACHE_INTERVAL", &value)?;
        }
        if let Some(value) = var("MAX_CONCURRENT_REQUESTS") {
            dispatcher.max_concurrent_requests = parse_var("MAX_CONCURRENT_REQUESTS", &value)?;
        }
        if let Some(value) = var("REQUEST_TIMEOUT") {
            dispatcher.request_timeout = parse_secs("REQUEST_TIMEOUT", &value)?;
        }
        if let Some(value) = var("LOG_LEVEL") {
            dispatcher.logging.level = value;
        }
        if let Some(value) = var("LOG_JSON") {
            dispatcher.logging.json = parse_var("LOG_JSON", &value)?;
        }

        let config = Self { dispatcher };
        config.validate()?;
        Ok(config)
    }

    /// Get circuit breaker configuration
    pub fn circuit_breaker(&self) -> &CircuitBreakerConfig {
        &self.dispatcher.circuit_breaker
    }

    /// Get retry configuration
    pub fn retry(&self) -> &RetryConfig {
        &self.dispatcher.retry
    }

    /// Get rate limit configuration
    pub fn rate_limit(&self) -> &RateLimitConfig {
        &self.dispatcher.rate_limit
    }

    /// Get logging configuration
    pub fn logging(&self) -> &LoggingConfig {
        &self.dispatcher.logging
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        debug!("Validating configuration");

        self.dispatcher
            .validate()
            .map_err(|e| DispatchError::Config(format!("Dispatcher config error: {}", e)))?;

        debug!("Configuration validation completed");
        Ok(())
    }

    /// Convert to JSON string
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.dispatcher).map_err(|e| {
            DispatchError::Config(format!("Failed to serialize config to JSON: {}", e))
        })
    }

    /// Convert to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(&self.dispatcher).map_err(|e| {
            DispatchError::Config(format!("Failed to serialize config to YAML: {}", e))
        })
    }
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        DispatchError::Config(format!("Invalid value for {}{}: {}", ENV_PREFIX, name, value))
    })
}

fn parse_secs(name: &str, value: &str) -> Result<Duration> {
    let secs: f64 = parse_var(name, value)?;
    Duration::try_from_secs_f64(secs).map_err(|e| {
        DispatchError::Config(format!("Invalid duration for {}{}: {}", ENV_PREFIX, name, e))
    })
}
