//! Backend selection
//!
//! - `strategy` - Selection strategies and their scoring functions
//! - `stats` - Rolling per-backend outcome statistics
//! - `load_balancer` - Usage-aware ordering of equally scored candidates
//! - `selector` - Filtering, scoring and selection over registered backends

pub mod load_balancer;
pub mod selector;
pub mod stats;
pub mod strategy;

pub use load_balancer::{LoadBalancer, LoadBalancerStatus, SCORE_TIE_EPSILON, ScoredCandidate};
pub use selector::{
    ModelInfo, ModelSelector, RankedModel, SelectionCriteria, SelectorInfo, rank_descriptors,
};
pub use stats::{ModelStats, ModelStatsSnapshot};
pub use strategy::{CandidateMetrics, ScoringContext, SelectionStrategy};
