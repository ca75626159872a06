//! Error handling for the dispatcher
//!
//! This module defines all error types used throughout the dispatcher.

use thiserror::Error;

/// Result type alias for the dispatcher
pub type Result<T> = std::result::Result<T, DispatchError>;

/// Main error type for the dispatcher
#[derive(Error, Debug)]
pub enum DispatchError {
    /// No backend satisfies the provider, health and constraint filters
    #[error("No model available{}: {reason}", provider_suffix(.provider))]
    ModelNotAvailable {
        provider: Option<String>,
        reason: String,
    },

    /// The circuit breaker guarding a backend is open
    #[error("Circuit breaker open for {name} (failures: {failure_count})")]
    CircuitOpen { name: String, failure_count: u32 },

    /// Every retry attempt against a single backend failed
    #[error("Retry exhausted after {attempts} attempts: {last_error}")]
    RetryExhausted { attempts: u32, last_error: String },

    /// Admission denied by a token bucket
    #[error("Rate limit exceeded for {service} (limit: {requests_per_minute}/min)")]
    RateLimitExceeded {
        service: String,
        requests_per_minute: u32,
    },

    /// Unrecognized selection strategy name
    #[error("Invalid strategy: {0}")]
    InvalidStrategy(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A single backend call failed
    #[error("Backend error: {0}")]
    Backend(String),

    /// Timeout errors
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

fn provider_suffix(provider: &Option<String>) -> String {
    match provider {
        Some(p) => format!(" for provider '{}'", p),
        None => String::new(),
    }
}

impl DispatchError {
    /// Shorthand for a [`DispatchError::ModelNotAvailable`] without a provider
    pub fn no_model(reason: impl Into<String>) -> Self {
        Self::ModelNotAvailable {
            provider: None,
            reason: reason.into(),
        }
    }

    /// Shorthand for a [`DispatchError::ModelNotAvailable`] scoped to a provider
    pub fn no_model_for(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ModelNotAvailable {
            provider: Some(provider.into()),
            reason: reason.into(),
        }
    }

    /// Stable machine-readable code for API responses and logs
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ModelNotAvailable { .. } => "MODEL_NOT_AVAILABLE",
            Self::CircuitOpen { .. } => "CIRCUIT_BREAKER_OPEN",
            Self::RetryExhausted { .. } => "RETRY_EXHAUSTED",
            Self::RateLimitExceeded { .. } => "RATE_LIMIT_EXCEEDED",
            Self::InvalidStrategy(_) => "INVALID_STRATEGY",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Backend(_) => "BACKEND_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::Io(_) => "IO_ERROR",
            Self::Yaml(_) => "YAML_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether this error, raised while calling one backend, should move the
    /// dispatcher on to the next ranked candidate
    pub fn triggers_fallback(&self) -> bool {
        matches!(
            self,
            Self::CircuitOpen { .. }
                | Self::RetryExhausted { .. }
                | Self::RateLimitExceeded { .. }
                | Self::Backend(_)
                | Self::Timeout(_)
        )
    }

    /// Errors raised at selection time: nothing can be attempted at all
    pub fn is_selection_error(&self) -> bool {
        matches!(
            self,
            Self::ModelNotAvailable { .. } | Self::InvalidStrategy(_)
        )
    }
}
