//! Selection strategies and their scoring functions
//!
//! Every strategy maps to a scoring function through a static table. Higher
//! scores are better for all strategies.

use crate::config::models::{AdaptiveTuning, BalancedWeights};
use crate::core::backend::BackendDescriptor;
use crate::core::router::stats::ModelStatsSnapshot;
use crate::utils::error::DispatchError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Offset keeping the cost score finite for free backends
pub const COST_EPSILON: f64 = 0.001;
/// Offset keeping the speed score finite for instant backends
pub const SPEED_EPSILON: f64 = 0.1;
/// Spread below which a metric is considered constant across candidates
const SPREAD_EPSILON: f64 = 1e-12;

/// Backend selection strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategy {
    /// Minimise estimated cost
    Cost,
    /// Maximise accuracy score
    Accuracy,
    /// Minimise response time
    Speed,
    /// Weighted composite of normalised accuracy, cost and speed
    #[default]
    Balanced,
    /// Balanced score adjusted by live success rate and latency
    Adaptive,
}

impl SelectionStrategy {
    pub const ALL: [SelectionStrategy; 5] = [
        Self::Cost,
        Self::Accuracy,
        Self::Speed,
        Self::Balanced,
        Self::Adaptive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cost => "cost",
            Self::Accuracy => "accuracy",
            Self::Speed => "speed",
            Self::Balanced => "balanced",
            Self::Adaptive => "adaptive",
        }
    }

    /// Names of all strategies, in table order
    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|s| s.as_str()).collect()
    }

    /// Scoring function for this strategy
    pub fn scorer(&self) -> ScoreFn {
        SCORERS[*self as usize].1
    }

    /// Whether equal scores should prefer the faster backend before the name
    pub fn prefers_fast_ties(&self) -> bool {
        matches!(self, Self::Balanced | Self::Adaptive)
    }
}

impl fmt::Display for SelectionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SelectionStrategy {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|strategy| strategy.as_str() == wanted)
            .ok_or_else(|| {
                DispatchError::InvalidStrategy(format!(
                    "unknown strategy '{}', supported: {}",
                    s,
                    Self::names().join(", ")
                ))
            })
    }
}

/// Inputs used to score one backend
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateMetrics {
    pub name: String,
    /// Estimated cost for the request's input size
    pub cost: f64,
    pub accuracy: f64,
    /// Static expected response time in seconds
    pub avg_response_time: f64,
    /// Live statistics, present once the backend has completed a call
    pub stats: Option<ModelStatsSnapshot>,
}

impl CandidateMetrics {
    pub fn from_descriptor(descriptor: &BackendDescriptor, input_size: usize) -> Self {
        Self {
            name: descriptor.name.clone(),
            cost: descriptor.estimate_cost(input_size),
            accuracy: descriptor.accuracy_score,
            avg_response_time: descriptor.avg_response_time,
            stats: None,
        }
    }

    pub fn with_stats(mut self, stats: Option<ModelStatsSnapshot>) -> Self {
        self.stats = stats.filter(|s| s.total_requests > 0);
        self
    }

    /// Response time to rank by: recent live average when available
    pub fn effective_response_time(&self) -> f64 {
        match &self.stats {
            Some(stats) if stats.recent_samples > 0 => stats.recent_avg_response_time,
            _ => self.avg_response_time,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Range {
    min: f64,
    max: f64,
}

impl Range {
    fn over(values: impl Iterator<Item = f64>) -> Self {
        values.fold(
            Range {
                min: f64::INFINITY,
                max: f64::NEG_INFINITY,
            },
            |r, v| Range {
                min: r.min.min(v),
                max: r.max.max(v),
            },
        )
    }

    /// Min-max normalisation; `flat` is used when the spread is zero
    fn normalize(&self, value: f64, flat: f64) -> f64 {
        let spread = self.max - self.min;
        if !(spread > SPREAD_EPSILON) {
            return flat;
        }
        ((value - self.min) / spread).clamp(0.0, 1.0)
    }
}

/// Candidate-set context shared by all scoring functions
#[derive(Debug, Clone)]
pub struct ScoringContext {
    weights: BalancedWeights,
    adaptive: AdaptiveTuning,
    accuracy: Range,
    cost: Range,
    time: Range,
}

impl ScoringContext {
    pub fn new(
        weights: BalancedWeights,
        adaptive: AdaptiveTuning,
        candidates: &[CandidateMetrics],
    ) -> Self {
        Self {
            weights,
            adaptive,
            accuracy: Range::over(candidates.iter().map(|c| c.accuracy)),
            cost: Range::over(candidates.iter().map(|c| c.cost)),
            time: Range::over(candidates.iter().map(|c| c.avg_response_time)),
        }
    }

    /// Score every candidate under `strategy`, preserving order
    pub fn score_all(
        &self,
        strategy: SelectionStrategy,
        candidates: &[CandidateMetrics],
    ) -> Vec<f64> {
        let scorer = strategy.scorer();
        candidates.iter().map(|c| scorer(self, c)).collect()
    }
}

pub type ScoreFn = fn(&ScoringContext, &CandidateMetrics) -> f64;

/// Strategy lookup table, indexed by discriminant
const SCORERS: [(SelectionStrategy, ScoreFn); 5] = [
    (SelectionStrategy::Cost, cost_score),
    (SelectionStrategy::Accuracy, accuracy_score),
    (SelectionStrategy::Speed, speed_score),
    (SelectionStrategy::Balanced, balanced_score),
    (SelectionStrategy::Adaptive, adaptive_score),
];

fn cost_score(_: &ScoringContext, candidate: &CandidateMetrics) -> f64 {
    1.0 / (candidate.cost + COST_EPSILON)
}

fn accuracy_score(_: &ScoringContext, candidate: &CandidateMetrics) -> f64 {
    candidate.accuracy
}

fn speed_score(_: &ScoringContext, candidate: &CandidateMetrics) -> f64 {
    1.0 / (candidate.effective_response_time() + SPEED_EPSILON)
}

fn balanced_score(ctx: &ScoringContext, candidate: &CandidateMetrics) -> f64 {
    let w = &ctx.weights;
    let total = w.total();
    if !(total > 0.0) {
        return 0.0;
    }

    let accuracy = ctx.accuracy.normalize(candidate.accuracy, 1.0);
    let cost = 1.0 - ctx.cost.normalize(candidate.cost, 0.0);
    let speed = 1.0 - ctx.time.normalize(candidate.avg_response_time, 0.0);

    (w.accuracy * accuracy + w.cost * cost + w.speed * speed) / total
}

fn adaptive_score(ctx: &ScoringContext, candidate: &CandidateMetrics) -> f64 {
    let base = balanced_score(ctx, candidate);
    let Some(stats) = &candidate.stats else {
        return base;
    };

    let tuning = &ctx.adaptive;
    let penalty =
        (stats.recent_avg_response_time / tuning.time_penalty_scale).min(tuning.max_time_penalty);
    let modifier = stats.success_rate - penalty;
    base * (tuning.base_weight + tuning.performance_weight * modifier)
}
