//! Model selection configuration

use serde::{Deserialize, Serialize};

/// Model selector configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectorConfig {
    /// Component weights for the balanced strategy
    #[serde(default)]
    pub balanced_weights: BalancedWeights,
    /// Tuning for the adaptive strategy
    #[serde(default)]
    pub adaptive: AdaptiveTuning,
    /// Number of recent response times kept per backend
    #[serde(default = "default_stats_window")]
    pub stats_window: usize,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            balanced_weights: BalancedWeights::default(),
            adaptive: AdaptiveTuning::default(),
            stats_window: default_stats_window(),
        }
    }
}

fn default_stats_window() -> usize {
    100
}

/// Equal weighting of accuracy, cost and speed
pub const EQUAL_WEIGHT: f64 = 1.0 / 3.0;

/// Weights for the balanced strategy's min-max normalised components
///
/// Only the ratio between weights matters; scores are divided by their sum.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BalancedWeights {
    #[serde(default = "default_equal_weight")]
    pub accuracy: f64,
    #[serde(default = "default_equal_weight")]
    pub cost: f64,
    #[serde(default = "default_equal_weight")]
    pub speed: f64,
}

impl Default for BalancedWeights {
    fn default() -> Self {
        Self {
            accuracy: EQUAL_WEIGHT,
            cost: EQUAL_WEIGHT,
            speed: EQUAL_WEIGHT,
        }
    }
}

impl BalancedWeights {
    pub fn total(&self) -> f64 {
        self.accuracy + self.cost + self.speed
    }
}

fn default_equal_weight() -> f64 {
    EQUAL_WEIGHT
}

/// Adaptive scoring: `base * (base_weight + performance_weight * (success_rate - penalty))`
/// with `penalty = min(max_time_penalty, recent_avg_response_time / time_penalty_scale)`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AdaptiveTuning {
    #[serde(default = "default_base_weight")]
    pub base_weight: f64,
    #[serde(default = "default_performance_weight")]
    pub performance_weight: f64,
    #[serde(default = "default_max_time_penalty")]
    pub max_time_penalty: f64,
    /// Seconds of recent average latency that map to a full point of penalty
    #[serde(default = "default_time_penalty_scale")]
    pub time_penalty_scale: f64,
}

impl Default for AdaptiveTuning {
    fn default() -> Self {
        Self {
            base_weight: default_base_weight(),
            performance_weight: default_performance_weight(),
            max_time_penalty: default_max_time_penalty(),
            time_penalty_scale: default_time_penalty_scale(),
        }
    }
}

fn default_base_weight() -> f64 {
    0.7
}

fn default_performance_weight() -> f64 {
    0.3
}

fn default_max_time_penalty() -> f64 {
    0.2
}

fn default_time_penalty_scale() -> f64 {
    10.0
}
