//! Load balancer for equally scored candidates
//!
//! Tracks how often each backend was selected and the running mean of its
//! recorded response times. Ranking ties go to the least used backend.

use super::strategy::SelectionStrategy;
use crate::core::backend::SharedBackend;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::cmp::{Ordering, Reverse};
use std::collections::BTreeMap;
use tracing::debug;

/// Scores closer than this are treated as equal
pub const SCORE_TIE_EPSILON: f64 = 1e-9;

/// A backend with its strategy score
#[derive(Clone)]
pub struct ScoredCandidate {
    pub backend: SharedBackend,
    pub score: f64,
}

impl std::fmt::Debug for ScoredCandidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoredCandidate")
            .field("backend", &self.backend.name())
            .field("score", &self.score)
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
struct UsageEntry {
    request_count: u64,
    avg_response_time: f64,
    samples: u64,
    last_used: Option<DateTime<Utc>>,
}

/// Snapshot returned by [`LoadBalancer::get_status`]
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadBalancerStatus {
    pub request_counts: BTreeMap<String, u64>,
    pub avg_response_times: BTreeMap<String, f64>,
    pub last_used: BTreeMap<String, DateTime<Utc>>,
}

/// Usage-aware tie breaker
#[derive(Debug, Default)]
pub struct LoadBalancer {
    entries: DashMap<String, UsageEntry>,
}

impl LoadBalancer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Order pre-scored candidates: score descending, then fewest
    /// selections. Balanced and adaptive strategies then prefer the lower
    /// recorded average response time. Name decides what is left.
    pub fn balance_candidates(
        &self,
        candidates: Vec<ScoredCandidate>,
        strategy: SelectionStrategy,
    ) -> Vec<ScoredCandidate> {
        let mut keyed: Vec<_> = candidates
            .into_iter()
            .map(|candidate| {
                let usage = self
                    .entries
                    .get(candidate.backend.name())
                    .map(|e| e.value().clone());
                let count = usage.as_ref().map_or(0, |u| u.request_count);
                let avg = usage
                    .filter(|u| u.samples > 0)
                    .map_or(candidate.backend.descriptor().avg_response_time, |u| {
                        u.avg_response_time
                    });
                let bucket = (candidate.score / SCORE_TIE_EPSILON).round() as i64;
                (bucket, count, avg, candidate)
            })
            .collect();

        let fast_ties = strategy.prefers_fast_ties();
        keyed.sort_by(|a, b| {
            Reverse(a.0)
                .cmp(&Reverse(b.0))
                .then(a.1.cmp(&b.1))
                .then_with(|| {
                    if fast_ties {
                        a.2.total_cmp(&b.2)
                    } else {
                        Ordering::Equal
                    }
                })
                .then_with(|| a.3.backend.name().cmp(b.3.backend.name()))
        });

        keyed.into_iter().map(|(_, _, _, c)| c).collect()
    }

    /// Count a selection of `name`
    pub fn record_selection(&self, name: &str) {
        let mut entry = self.entries.entry(name.to_string()).or_default();
        entry.request_count += 1;
        entry.last_used = Some(Utc::now());
        debug!(backend = %name, count = entry.request_count, "Recorded selection");
    }

    /// Fold a response time into the running mean for `name`
    pub fn record_response_time(&self, name: &str, seconds: f64) {
        if !seconds.is_finite() || seconds < 0.0 {
            return;
        }
        let mut entry = self.entries.entry(name.to_string()).or_default();
        entry.samples += 1;
        entry.avg_response_time += (seconds - entry.avg_response_time) / entry.samples as f64;
    }

    pub fn request_count(&self, name: &str) -> u64 {
        self.entries.get(name).map_or(0, |e| e.request_count)
    }

    pub fn avg_response_time(&self, name: &str) -> Option<f64> {
        self.entries
            .get(name)
            .filter(|e| e.samples > 0)
            .map(|e| e.avg_response_time)
    }

    pub fn get_status(&self) -> LoadBalancerStatus {
        let mut status = LoadBalancerStatus::default();
        for entry in self.entries.iter() {
            let name = entry.key();
            status.request_counts.insert(name.clone(), entry.request_count);
            if entry.samples > 0 {
                status
                    .avg_response_times
                    .insert(name.clone(), entry.avg_response_time);
            }
            if let Some(at) = entry.last_used {
                status.last_used.insert(name.clone(), at);
            }
        }
        status
    }
}
