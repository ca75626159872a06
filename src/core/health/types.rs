//! Health cache types

use serde::Serialize;
use std::collections::BTreeMap;
use tokio::time::Instant;

/// Last probe result for one backend
#[derive(Debug, Clone, Copy)]
pub struct HealthEntry {
    pub is_healthy: bool,
    pub checked_at: Instant,
}

impl HealthEntry {
    pub fn new(is_healthy: bool) -> Self {
        Self {
            is_healthy,
            checked_at: Instant::now(),
        }
    }

    pub fn age_seconds(&self) -> f64 {
        self.checked_at.elapsed().as_secs_f64()
    }
}

/// Per-backend view in [`HealthCacheStatus`]
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HealthEntryStatus {
    pub is_healthy: bool,
    pub age_seconds: f64,
}

/// Snapshot of the health cache
#[derive(Debug, Clone, Serialize)]
pub struct HealthCacheStatus {
    pub cached_entries: usize,
    /// Cache TTL in seconds
    pub cache_interval: f64,
    pub entries: BTreeMap<String, HealthEntryStatus>,
}
