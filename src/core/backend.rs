//! Backend adapter capability
//!
//! The dispatcher never talks to a vision provider directly. It only needs a
//! backend to expose recognition, a health probe, and static descriptor
//! metadata used for scoring.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

const BYTES_PER_MEGABYTE: f64 = 1024.0 * 1024.0;

/// Cost estimator over input size
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct CostModel {
    /// Flat cost charged for every call
    #[serde(default)]
    pub per_call: f64,
    /// Additional cost per megabyte of image input
    #[serde(default)]
    pub per_megabyte: f64,
}

impl CostModel {
    /// Flat per-call pricing
    pub fn per_call(cost: f64) -> Self {
        Self {
            per_call: cost,
            per_megabyte: 0.0,
        }
    }

    /// Add size-dependent pricing
    pub fn with_per_megabyte(mut self, cost: f64) -> Self {
        self.per_megabyte = cost;
        self
    }

    /// Estimated cost of one call for an input of `input_bytes`
    pub fn estimate(&self, input_bytes: usize) -> f64 {
        self.per_call + self.per_megabyte * (input_bytes as f64 / BYTES_PER_MEGABYTE)
    }
}

/// Immutable reference metadata for a backend, set at registration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackendDescriptor {
    /// Unique model name
    pub name: String,
    /// Provider name
    pub provider: String,
    #[serde(default)]
    pub cost: CostModel,
    /// Expected accuracy in `[0, 1]`
    pub accuracy_score: f64,
    /// Expected response time in seconds
    pub avg_response_time: f64,
    /// Capability flags, e.g. `multilingual`
    #[serde(default)]
    pub capabilities: Vec<String>,
}

impl BackendDescriptor {
    pub fn new(name: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            provider: provider.into(),
            cost: CostModel::default(),
            accuracy_score: 0.5,
            avg_response_time: 1.0,
            capabilities: Vec::new(),
        }
    }

    pub fn with_cost(mut self, cost: CostModel) -> Self {
        self.cost = cost;
        self
    }

    pub fn with_accuracy(mut self, accuracy_score: f64) -> Self {
        self.accuracy_score = accuracy_score;
        self
    }

    pub fn with_avg_response_time(mut self, seconds: f64) -> Self {
        self.avg_response_time = seconds;
        self
    }

    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.push(capability.into());
        self
    }

    /// Estimated cost for an input size; zero bytes gives the flat per-call cost
    pub fn estimate_cost(&self, input_bytes: usize) -> f64 {
        self.cost.estimate(input_bytes)
    }

    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|c| c == capability)
    }
}

/// A single recognised artwork
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ArtworkCandidate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artwork_id: Option<String>,
    pub name: String,
    pub artist: String,
    /// Confidence in `[0, 1]`
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub museum_section: Option<String>,
    #[serde(default)]
    pub visual_features: Vec<String>,
}

impl ArtworkCandidate {
    pub fn new(name: impl Into<String>, artist: impl Into<String>, confidence: f64) -> Self {
        Self {
            name: name.into(),
            artist: artist.into(),
            confidence,
            ..Default::default()
        }
    }
}

/// Raw result returned by a backend
///
/// A result with `success == false` is treated as a failure signal.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RecognitionResult {
    pub success: bool,
    #[serde(default)]
    pub candidates: Vec<ArtworkCandidate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
}

impl RecognitionResult {
    pub fn success(candidates: Vec<ArtworkCandidate>) -> Self {
        Self {
            success: true,
            candidates,
            error: None,
            model_used: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            candidates: Vec::new(),
            error: Some(error.into()),
            model_used: None,
        }
    }
}

/// Errors raised by a backend adapter
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Provider rate limit hit: {0}")]
    RateLimited(String),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Recognition unsuccessful: {0}")]
    Unsuccessful(String),

    #[error("{0}")]
    Other(String),
}

impl BackendError {
    /// Whether another attempt against the same backend may succeed
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::InvalidInput(_))
    }
}

/// Capability every vision backend exposes to the dispatcher
#[async_trait]
pub trait BackendAdapter: Send + Sync {
    /// Static descriptor used for scoring and filtering
    fn descriptor(&self) -> &BackendDescriptor;

    fn name(&self) -> &str {
        &self.descriptor().name
    }

    fn provider(&self) -> &str {
        &self.descriptor().provider
    }

    fn estimate_cost(&self, input_bytes: usize) -> f64 {
        self.descriptor().estimate_cost(input_bytes)
    }

    /// Recognise the artwork in `image`, answering in `language`
    async fn recognize(
        &self,
        image: &[u8],
        language: &str,
    ) -> Result<RecognitionResult, BackendError>;

    /// Live health probe; an error is treated as unhealthy
    async fn health_check(&self) -> Result<bool, BackendError>;
}

impl fmt::Debug for dyn BackendAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendAdapter")
            .field("name", &self.name())
            .field("provider", &self.provider())
            .finish()
    }
}

/// Shared handle to a registered backend
pub type SharedBackend = Arc<dyn BackendAdapter>;
