//! Model selector
//!
//! Filters the registered backends by provider, health and constraints,
//! scores what is left with the requested strategy and lets the load
//! balancer break ties.

use super::load_balancer::{LoadBalancer, ScoredCandidate};
use super::stats::{ModelStats, ModelStatsSnapshot};
use super::strategy::{CandidateMetrics, ScoringContext, SelectionStrategy};
use crate::config::models::SelectorConfig;
use crate::core::backend::{BackendDescriptor, SharedBackend};
use crate::core::health::HealthCache;
use crate::utils::error::{DispatchError, Result};
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Filters and strategy for one selection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionCriteria {
    pub strategy: SelectionStrategy,
    pub provider: Option<String>,
    pub max_cost: Option<f64>,
    pub min_accuracy: Option<f64>,
    pub required_capabilities: Vec<String>,
    /// Image size in bytes used for cost estimates
    pub input_size: usize,
}

impl SelectionCriteria {
    pub fn new(strategy: SelectionStrategy) -> Self {
        Self {
            strategy,
            ..Default::default()
        }
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn with_max_cost(mut self, max_cost: f64) -> Self {
        self.max_cost = Some(max_cost);
        self
    }

    pub fn with_min_accuracy(mut self, min_accuracy: f64) -> Self {
        self.min_accuracy = Some(min_accuracy);
        self
    }

    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.required_capabilities.push(capability.into());
        self
    }

    pub fn with_input_size(mut self, input_size: usize) -> Self {
        self.input_size = input_size;
        self
    }

    fn matches_provider(&self, descriptor: &BackendDescriptor) -> bool {
        self.provider
            .as_deref()
            .is_none_or(|p| descriptor.provider == p)
    }

    /// Cost, accuracy and capability constraints
    pub fn satisfied_by(&self, descriptor: &BackendDescriptor) -> bool {
        if let Some(max_cost) = self.max_cost {
            if descriptor.estimate_cost(self.input_size) > max_cost {
                return false;
            }
        }
        if let Some(min_accuracy) = self.min_accuracy {
            if descriptor.accuracy_score < min_accuracy {
                return false;
            }
        }
        self.required_capabilities
            .iter()
            .all(|c| descriptor.has_capability(c))
    }

    fn no_model(&self, reason: &str) -> DispatchError {
        match &self.provider {
            Some(provider) => DispatchError::no_model_for(provider.clone(), reason),
            None => DispatchError::no_model(reason),
        }
    }
}

/// Ranking entry exposed for observability
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RankedModel {
    pub model_name: String,
    pub provider: String,
    pub score: f64,
    pub accuracy: f64,
    pub cost: f64,
    pub response_time: f64,
}

/// Descriptor plus live statistics
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    #[serde(flatten)]
    pub descriptor: BackendDescriptor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<ModelStatsSnapshot>,
}

/// Selector summary
#[derive(Debug, Clone, Serialize)]
pub struct SelectorInfo {
    pub total_models: usize,
    pub providers: Vec<String>,
    pub strategies: Vec<&'static str>,
    pub current_model: Option<String>,
    pub model_stats: BTreeMap<String, ModelStatsSnapshot>,
}

/// Strategy-driven backend selector
pub struct ModelSelector {
    backends: Vec<SharedBackend>,
    config: SelectorConfig,
    stats: DashMap<String, ModelStats>,
    health_cache: Arc<HealthCache>,
    load_balancer: Arc<LoadBalancer>,
    current_model: RwLock<Option<String>>,
}

impl ModelSelector {
    pub fn new(
        backends: Vec<SharedBackend>,
        config: SelectorConfig,
        health_cache: Arc<HealthCache>,
        load_balancer: Arc<LoadBalancer>,
    ) -> Self {
        Self {
            backends,
            config,
            stats: DashMap::new(),
            health_cache,
            load_balancer,
            current_model: RwLock::new(None),
        }
    }

    pub fn backends(&self) -> &[SharedBackend] {
        &self.backends
    }

    pub fn backend(&self, name: &str) -> Option<SharedBackend> {
        self.backends.iter().find(|b| b.name() == name).cloned()
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// Healthy, constraint-satisfying candidates in ranked order
    pub async fn rank_candidates(
        &self,
        criteria: &SelectionCriteria,
    ) -> Result<Vec<ScoredCandidate>> {
        if self.backends.is_empty() {
            return Err(DispatchError::no_model("No models registered"));
        }

        let by_provider: Vec<SharedBackend> = self
            .backends
            .iter()
            .filter(|b| criteria.matches_provider(b.descriptor()))
            .cloned()
            .collect();
        if by_provider.is_empty() {
            return Err(criteria.no_model("Provider not available"));
        }

        let healthy = self.health_cache.get_healthy(&by_provider).await;
        if healthy.is_empty() {
            return Err(criteria.no_model("No healthy models available"));
        }

        let eligible: Vec<SharedBackend> = healthy
            .into_iter()
            .filter(|b| criteria.satisfied_by(b.descriptor()))
            .collect();
        if eligible.is_empty() {
            return Err(criteria.no_model("No models meet the constraints"));
        }

        let metrics: Vec<CandidateMetrics> = eligible
            .iter()
            .map(|b| {
                CandidateMetrics::from_descriptor(b.descriptor(), criteria.input_size)
                    .with_stats(self.model_stats(b.name()))
            })
            .collect();
        let scores = self.scoring_context(&metrics).score_all(criteria.strategy, &metrics);

        let scored = eligible
            .into_iter()
            .zip(scores)
            .map(|(backend, score)| ScoredCandidate { backend, score })
            .collect();

        Ok(self
            .load_balancer
            .balance_candidates(scored, criteria.strategy))
    }

    /// Pick the top ranked backend and count the selection
    pub async fn select_best_model(&self, criteria: &SelectionCriteria) -> Result<SharedBackend> {
        let ranked = self.rank_candidates(criteria).await?;
        let best = ranked
            .into_iter()
            .next()
            .ok_or_else(|| criteria.no_model("No models meet the constraints"))?;

        self.mark_selected(&best);
        info!(
            backend = %best.backend.name(),
            strategy = %criteria.strategy,
            score = best.score,
            "Selected model"
        );
        Ok(best.backend)
    }

    /// Select using live performance statistics
    pub async fn select_adaptive_model(&self) -> Result<SharedBackend> {
        self.select_best_model(&SelectionCriteria::new(SelectionStrategy::Adaptive))
            .await
    }

    /// Record that `candidate` was chosen
    pub fn mark_selected(&self, candidate: &ScoredCandidate) {
        let name = candidate.backend.name();
        self.load_balancer.record_selection(name);
        *self.current_model.write() = Some(name.to_string());
    }

    /// Full ranking of every registered backend, ignoring health
    pub fn get_model_ranking(&self, strategy: SelectionStrategy) -> Vec<RankedModel> {
        let metrics: Vec<CandidateMetrics> = self
            .backends
            .iter()
            .map(|b| {
                CandidateMetrics::from_descriptor(b.descriptor(), 0)
                    .with_stats(self.model_stats(b.name()))
            })
            .collect();
        let descriptors: Vec<&BackendDescriptor> =
            self.backends.iter().map(|b| b.descriptor()).collect();

        rank_metrics(&self.scoring_context(&metrics), strategy, &descriptors, &metrics)
    }

    fn scoring_context(&self, metrics: &[CandidateMetrics]) -> ScoringContext {
        ScoringContext::new(
            self.config.balanced_weights,
            self.config.adaptive,
            metrics,
        )
    }

    /// Fold one completed call into the rolling statistics for `name`
    pub fn update_model_stats(&self, name: &str, success: bool, response_time: f64) {
        let window = self.config.stats_window;
        let mut stats = self
            .stats
            .entry(name.to_string())
            .or_insert_with(|| ModelStats::new(window));
        stats.record(success, response_time);
        debug!(
            backend = %name,
            success,
            response_time,
            success_rate = stats.success_rate(),
            "Updated model stats"
        );
    }

    pub fn model_stats(&self, name: &str) -> Option<ModelStatsSnapshot> {
        self.stats.get(name).map(|s| s.snapshot())
    }

    pub fn get_available_models(&self) -> Vec<ModelInfo> {
        self.backends
            .iter()
            .map(|b| ModelInfo {
                descriptor: b.descriptor().clone(),
                stats: self.model_stats(b.name()),
            })
            .collect()
    }

    /// Providers in registration order
    pub fn get_available_providers(&self) -> Vec<String> {
        let mut providers: Vec<String> = Vec::new();
        for backend in &self.backends {
            if !providers.iter().any(|p| p == backend.provider()) {
                providers.push(backend.provider().to_string());
            }
        }
        providers
    }

    pub fn current_model(&self) -> Option<String> {
        self.current_model.read().clone()
    }

    pub fn selector_info(&self) -> SelectorInfo {
        SelectorInfo {
            total_models: self.backends.len(),
            providers: self.get_available_providers(),
            strategies: SelectionStrategy::names(),
            current_model: self.current_model(),
            model_stats: self
                .stats
                .iter()
                .map(|entry| (entry.key().clone(), entry.value().snapshot()))
                .collect(),
        }
    }
}

/// Rank static descriptors without health probes or live statistics
pub fn rank_descriptors(
    descriptors: &[BackendDescriptor],
    criteria: &SelectionCriteria,
    config: &SelectorConfig,
) -> Vec<RankedModel> {
    let eligible: Vec<&BackendDescriptor> = descriptors
        .iter()
        .filter(|d| criteria.matches_provider(d) && criteria.satisfied_by(d))
        .collect();
    let metrics: Vec<CandidateMetrics> = eligible
        .iter()
        .map(|d| CandidateMetrics::from_descriptor(d, criteria.input_size))
        .collect();
    let ctx = ScoringContext::new(config.balanced_weights, config.adaptive, &metrics);

    rank_metrics(&ctx, criteria.strategy, &eligible, &metrics)
}

fn rank_metrics(
    ctx: &ScoringContext,
    strategy: SelectionStrategy,
    descriptors: &[&BackendDescriptor],
    metrics: &[CandidateMetrics],
) -> Vec<RankedModel> {
    let scores = ctx.score_all(strategy, metrics);
    let mut ranking: Vec<RankedModel> = descriptors
        .iter()
        .zip(metrics)
        .zip(scores)
        .map(|((d, m), score)| RankedModel {
            model_name: d.name.clone(),
            provider: d.provider.clone(),
            score,
            accuracy: d.accuracy_score,
            cost: m.cost,
            response_time: m.effective_response_time(),
        })
        .collect();

    ranking.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.model_name.cmp(&b.model_name))
    });
    ranking
}
