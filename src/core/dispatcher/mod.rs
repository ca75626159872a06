//! Dispatcher
//!
//! Composes the health cache, selector, load balancer, reliability
//! registry and request monitor into a single instance owned by the caller.
//!
//! - `execute` - Recognition with retry, circuit breaking and fallback
//! - `status` - Serialisable observability snapshot

pub mod execute;
pub mod status;

pub use execute::{AttemptRecord, RecognitionOutcome};
pub use status::{ConcurrencyStatus, ConfigSnapshot, DispatcherStatus, ReliabilityStatus};

use crate::config::models::{CircuitBreakerConfig, DispatcherConfig, RateLimitConfig, RetryConfig};
use crate::config::validation::{Validate, validate_backends};
use crate::core::backend::{BackendDescriptor, SharedBackend};
use crate::core::health::HealthCache;
use crate::core::monitoring::RequestMonitor;
use crate::core::reliability::{Bulkhead, ReliabilityRegistry};
use crate::core::router::{
    LoadBalancer, ModelSelector, RankedModel, SelectionCriteria, SelectionStrategy,
};
use crate::utils::error::{DispatchError, Result};
use std::sync::Arc;
use tracing::info;

/// Admission bucket consumed by every selection
pub const SELECTION_BUCKET: &str = "model_selector";

/// Builder for [`Dispatcher`]
#[derive(Default)]
pub struct DispatcherBuilder {
    config: DispatcherConfig,
    backends: Vec<SharedBackend>,
}

impl DispatcherBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    /// Register a backend; registration order is the provider listing order
    pub fn backend(mut self, backend: SharedBackend) -> Self {
        self.backends.push(backend);
        self
    }

    pub fn backends(mut self, backends: impl IntoIterator<Item = SharedBackend>) -> Self {
        self.backends.extend(backends);
        self
    }

    /// Validate the configuration and the registered backends
    pub fn build(self) -> Result<Dispatcher> {
        self.config.validate().map_err(DispatchError::Config)?;

        let descriptors: Vec<BackendDescriptor> = self
            .backends
            .iter()
            .map(|b| b.descriptor().clone())
            .collect();
        validate_backends(&descriptors).map_err(DispatchError::Config)?;

        Ok(Dispatcher::from_parts(self.config, self.backends))
    }
}

/// Adaptive reliability and selection dispatcher
pub struct Dispatcher {
    config: DispatcherConfig,
    registry: ReliabilityRegistry,
    health_cache: Arc<HealthCache>,
    load_balancer: Arc<LoadBalancer>,
    selector: ModelSelector,
    bulkhead: Bulkhead,
    monitor: Arc<RequestMonitor>,
}

impl Dispatcher {
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    fn from_parts(config: DispatcherConfig, backends: Vec<SharedBackend>) -> Self {
        let monitor = Arc::new(RequestMonitor::new());
        let health_cache =
            Arc::new(HealthCache::new(config.health.clone()).with_monitor(monitor.clone()));
        let load_balancer = Arc::new(LoadBalancer::new());
        let selector = ModelSelector::new(
            backends,
            config.selector.clone(),
            health_cache.clone(),
            load_balancer.clone(),
        );
        let registry = ReliabilityRegistry::new(
            config.circuit_breaker.clone(),
            config.retry.clone(),
            config.rate_limit.clone(),
            config.backend_rate_limit.clone(),
        );
        let bulkhead = Bulkhead::new("recognize", config.max_concurrent_requests);

        info!(
            backends = selector.backends().len(),
            strategy = %config.default_strategy,
            "Dispatcher initialized"
        );

        Self {
            config,
            registry,
            health_cache,
            load_balancer,
            selector,
            bulkhead,
            monitor,
        }
    }

    /// Configuration the dispatcher was built with
    ///
    /// Reliability settings changed at runtime are read from
    /// [`Dispatcher::registry`].
    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    pub fn registry(&self) -> &ReliabilityRegistry {
        &self.registry
    }

    pub fn selector(&self) -> &ModelSelector {
        &self.selector
    }

    pub fn health_cache(&self) -> &HealthCache {
        &self.health_cache
    }

    pub fn load_balancer(&self) -> &LoadBalancer {
        &self.load_balancer
    }

    pub fn monitor(&self) -> &RequestMonitor {
        &self.monitor
    }

    /// Consume a selection token when rate limiting is enabled
    fn admit(&self) -> Result<()> {
        if !self.registry.rate_limit_config().enabled {
            return Ok(());
        }
        self.registry.rate_limiter(SELECTION_BUCKET).acquire()
    }

    /// Choose a backend for `criteria`
    ///
    /// Admission runs first, so an exhausted bucket fails before any backend
    /// is considered.
    pub async fn select_best_model(&self, criteria: &SelectionCriteria) -> Result<SharedBackend> {
        self.admit()?;
        self.selector.select_best_model(criteria).await
    }

    /// Choose a backend with the configured default strategy
    pub async fn select_default_model(&self) -> Result<SharedBackend> {
        self.select_best_model(&SelectionCriteria::new(self.config.default_strategy))
            .await
    }

    pub async fn select_adaptive_model(&self) -> Result<SharedBackend> {
        self.admit()?;
        self.selector.select_adaptive_model().await
    }

    pub fn get_model_ranking(&self, strategy: SelectionStrategy) -> Vec<RankedModel> {
        self.selector.get_model_ranking(strategy)
    }

    pub fn clear_health_cache(&self) {
        self.health_cache.clear();
    }

    /// Swap reliability settings at runtime
    ///
    /// Every supplied config is validated before any is applied. Breakers and
    /// buckets created afterwards use the new values; existing ones keep
    /// theirs. The health cache is cleared.
    pub fn update_reliability_config(
        &self,
        circuit_breaker: Option<CircuitBreakerConfig>,
        retry: Option<RetryConfig>,
        rate_limit: Option<RateLimitConfig>,
    ) -> Result<()> {
        if let Some(config) = &circuit_breaker {
            config
                .validate()
                .map_err(|e| DispatchError::Config(format!("circuit_breaker: {}", e)))?;
        }
        if let Some(config) = &retry {
            config
                .validate()
                .map_err(|e| DispatchError::Config(format!("retry: {}", e)))?;
        }
        if let Some(config) = rate_limit.as_ref().filter(|c| c.enabled) {
            config
                .validate()
                .map_err(|e| DispatchError::Config(format!("rate_limit: {}", e)))?;
        }

        if let Some(config) = circuit_breaker {
            self.registry.set_circuit_breaker_config(config);
        }
        if let Some(config) = retry {
            self.registry.set_retry_config(config);
        }
        if let Some(config) = rate_limit {
            self.registry.set_rate_limit_config(config);
        }

        self.health_cache.clear();
        info!("Reliability configuration updated");
        Ok(())
    }

    /// Fold one invoked attempt into selector stats and load balancer timing
    fn record_outcome(&self, name: &str, success: bool, response_time: f64) {
        self.selector.update_model_stats(name, success, response_time);
        self.load_balancer.record_response_time(name, response_time);
    }
}
