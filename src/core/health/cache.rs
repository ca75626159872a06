//! TTL-bounded cache of backend health probes
//!
//! Every backend has its own async slot. The first caller to find a slot
//! empty or stale probes while holding it; concurrent callers for the same
//! backend wait on the slot and reuse the fresh result. A copy of each
//! result is published outside the slot so status reads never wait on a
//! probe.

use super::types::{HealthCacheStatus, HealthEntry, HealthEntryStatus};
use crate::config::models::HealthCacheConfig;
use crate::core::backend::SharedBackend;
use crate::core::monitoring::RequestMonitor;
use crate::core::reliability::TimeoutWrapper;
use dashmap::DashMap;
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

type Slot = Arc<Mutex<Option<HealthEntry>>>;

/// Health probe cache
#[derive(Debug)]
pub struct HealthCache {
    config: HealthCacheConfig,
    entries: DashMap<String, Slot>,
    published: DashMap<String, HealthEntry>,
    monitor: Option<Arc<RequestMonitor>>,
}

impl HealthCache {
    pub fn new(config: HealthCacheConfig) -> Self {
        Self {
            config,
            entries: DashMap::new(),
            published: DashMap::new(),
            monitor: None,
        }
    }

    /// Report cache hits and misses to `monitor`
    pub fn with_monitor(mut self, monitor: Arc<RequestMonitor>) -> Self {
        self.monitor = Some(monitor);
        self
    }

    pub fn config(&self) -> &HealthCacheConfig {
        &self.config
    }

    /// Filter `candidates` down to healthy backends, probing where the cache
    /// is stale; probes for different backends run concurrently
    pub async fn get_healthy(&self, candidates: &[SharedBackend]) -> Vec<SharedBackend> {
        let checks = candidates.iter().map(|backend| self.is_healthy(backend));
        let results = join_all(checks).await;

        candidates
            .iter()
            .zip(results)
            .filter_map(|(backend, healthy)| healthy.then(|| backend.clone()))
            .collect()
    }

    /// Cached health of one backend, probing when missing or expired
    pub async fn is_healthy(&self, backend: &SharedBackend) -> bool {
        let name = backend.name();
        let slot = self.slot(name);
        let mut entry = slot.lock().await;

        if let Some(cached) = entry.as_ref() {
            if cached.checked_at.elapsed() < self.config.cache_interval {
                self.record_lookup(name, true);
                return cached.is_healthy;
            }
        }

        self.record_lookup(name, false);
        let is_healthy = self.probe(backend).await;
        let fresh = HealthEntry::new(is_healthy);
        *entry = Some(fresh);
        self.publish(name, &slot, fresh);
        is_healthy
    }

    fn record_lookup(&self, name: &str, hit: bool) {
        if let Some(monitor) = &self.monitor {
            monitor.record_cache_event(name, hit);
        }
    }

    /// Publish `entry` unless the slot was cleared while probing
    fn publish(&self, name: &str, slot: &Slot, entry: HealthEntry) {
        let current = self
            .entries
            .get(name)
            .is_some_and(|s| Arc::ptr_eq(s.value(), slot));
        if current {
            self.published.insert(name.to_string(), entry);
        }
    }

    fn slot(&self, name: &str) -> Slot {
        if let Some(slot) = self.entries.get(name) {
            return slot.value().clone();
        }
        self.entries
            .entry(name.to_string())
            .or_default()
            .value()
            .clone()
    }

    async fn probe(&self, backend: &SharedBackend) -> bool {
        let name = backend.name();
        let timeout = TimeoutWrapper::new(self.config.probe_timeout);

        match timeout.call(backend.health_check()).await {
            Ok(Ok(is_healthy)) => {
                debug!(backend = %name, is_healthy, "Health probe completed");
                is_healthy
            }
            Ok(Err(e)) => {
                warn!(backend = %name, error = %e, "Health probe failed");
                false
            }
            Err(e) => {
                warn!(backend = %name, error = %e, "Health probe timed out");
                false
            }
        }
    }

    /// Drop every cached entry
    pub fn clear(&self) {
        self.entries.clear();
        self.published.clear();
        debug!("Health cache cleared");
    }

    /// Number of backends with a cached probe result, stale ones included
    pub fn len(&self) -> usize {
        self.published.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of cached entries
    ///
    /// An entry being re-probed reports its previous result until the probe
    /// completes.
    pub fn status(&self) -> HealthCacheStatus {
        let entries: std::collections::BTreeMap<_, _> = self
            .published
            .iter()
            .map(|entry| {
                let cached = entry.value();
                (
                    entry.key().clone(),
                    HealthEntryStatus {
                        is_healthy: cached.is_healthy,
                        age_seconds: cached.age_seconds(),
                    },
                )
            })
            .collect();

        HealthCacheStatus {
            cached_entries: entries.len(),
            cache_interval: self.config.cache_interval.as_secs_f64(),
            entries,
        }
    }
}
