//! Top-level configuration validators

use super::trait_def::Validate;
use crate::config::models::*;
use crate::core::backend::BackendDescriptor;
use std::collections::HashSet;
use tracing::debug;

impl Validate for DispatcherConfig {
    fn validate(&self) -> Result<(), String> {
        debug!("Validating dispatcher configuration");

        self.circuit_breaker
            .validate()
            .map_err(|e| format!("circuit_breaker: {}", e))?;
        self.retry.validate().map_err(|e| format!("retry: {}", e))?;

        if self.rate_limit.enabled {
            self.rate_limit
                .validate()
                .map_err(|e| format!("rate_limit: {}", e))?;
        }

        if let Some(backend_limit) = &self.backend_rate_limit {
            backend_limit
                .validate()
                .map_err(|e| format!("backend_rate_limit: {}", e))?;
        }

        self.health.validate().map_err(|e| format!("health: {}", e))?;
        self.selector
            .validate()
            .map_err(|e| format!("selector: {}", e))?;

        if self.max_concurrent_requests == 0 {
            return Err("max_concurrent_requests must be greater than 0".to_string());
        }

        if self.request_timeout.is_zero() {
            return Err("request_timeout must be greater than 0".to_string());
        }

        validate_backends(&self.backends)
    }
}

impl Validate for BackendDescriptor {
    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Backend name cannot be empty".to_string());
        }

        if self.provider.trim().is_empty() {
            return Err(format!("Backend {} has an empty provider", self.name));
        }

        if !(0.0..=1.0).contains(&self.accuracy_score) {
            return Err(format!(
                "Backend {} accuracy score must be between 0.0 and 1.0",
                self.name
            ));
        }

        if self.cost.per_call < 0.0 || self.cost.per_megabyte < 0.0 {
            return Err(format!("Backend {} cost cannot be negative", self.name));
        }

        if !(self.avg_response_time > 0.0) {
            return Err(format!(
                "Backend {} average response time must be greater than 0",
                self.name
            ));
        }

        Ok(())
    }
}

/// Validate a set of descriptors, rejecting duplicate names
pub fn validate_backends(backends: &[BackendDescriptor]) -> Result<(), String> {
    let mut seen = HashSet::new();
    for backend in backends {
        backend.validate()?;
        if !seen.insert(backend.name.as_str()) {
            return Err(format!("Duplicate backend name: {}", backend.name));
        }
    }
    Ok(())
}
