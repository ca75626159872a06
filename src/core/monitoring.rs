//! Request monitoring
//!
//! Per-backend request counters, circuit transitions and health cache
//! events. [`RequestMonitor::track`] wraps a single backend call; the
//! dispatcher composes it inside the retry loop, so every attempt is
//! counted.

use crate::core::reliability::CircuitState;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Circuit transitions kept for the status snapshot
pub const MAX_CIRCUIT_EVENTS: usize = 100;

#[derive(Debug, Default)]
struct BackendCounters {
    in_flight: u64,
    completed: u64,
    failed: u64,
    cancelled: u64,
    total_latency: f64,
    last_error: Option<String>,
    last_request: Option<DateTime<Utc>>,
}

impl BackendCounters {
    fn finished(&self) -> u64 {
        self.completed + self.failed
    }

    fn snapshot(&self) -> BackendRequestStats {
        let finished = self.finished();
        BackendRequestStats {
            in_flight: self.in_flight,
            completed: self.completed,
            failed: self.failed,
            cancelled: self.cancelled,
            avg_latency: if finished == 0 {
                0.0
            } else {
                self.total_latency / finished as f64
            },
            last_error: self.last_error.clone(),
            last_request: self.last_request,
        }
    }
}

/// Request counters for one backend
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct BackendRequestStats {
    pub in_flight: u64,
    pub completed: u64,
    pub failed: u64,
    /// Calls dropped before they finished, e.g. by a request deadline
    pub cancelled: u64,
    /// Mean seconds over completed and failed calls
    pub avg_latency: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_request: Option<DateTime<Utc>>,
}

/// One observed circuit breaker state change
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CircuitEvent {
    pub backend: String,
    pub from: CircuitState,
    pub to: CircuitState,
    pub at: DateTime<Utc>,
}

/// Snapshot returned by [`RequestMonitor::status`]
#[derive(Debug, Clone, Default, Serialize)]
pub struct RequestMonitorStatus {
    pub total_requests: u64,
    pub active_requests: u64,
    pub total_errors: u64,
    pub backends: BTreeMap<String, BackendRequestStats>,
    /// Most recent first
    pub circuit_events: Vec<CircuitEvent>,
    pub health_cache_hits: u64,
    pub health_cache_misses: u64,
}

impl RequestMonitorStatus {
    /// Share of health lookups answered from the cache
    pub fn health_cache_hit_rate(&self) -> f64 {
        let total = self.health_cache_hits + self.health_cache_misses;
        if total == 0 {
            0.0
        } else {
            self.health_cache_hits as f64 / total as f64
        }
    }
}

/// Request monitor shared by the dispatcher and its health cache
#[derive(Debug, Default)]
pub struct RequestMonitor {
    backends: DashMap<String, BackendCounters>,
    circuit_events: Mutex<VecDeque<CircuitEvent>>,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
}

impl RequestMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `call` as one tracked request against `backend`
    pub async fn track<F, R, E>(&self, backend: &str, call: F) -> Result<R, E>
    where
        F: Future<Output = Result<R, E>>,
        E: Display,
    {
        let guard = self.start(backend);
        let result = call.await;
        match &result {
            Ok(_) => guard.finish(None),
            Err(e) => guard.finish(Some(e.to_string())),
        }
        result
    }

    /// Mark a request as in flight until the guard is finished or dropped
    pub fn start(&self, backend: &str) -> RequestGuard<'_> {
        let mut counters = self.backends.entry(backend.to_string()).or_default();
        counters.in_flight += 1;
        counters.last_request = Some(Utc::now());
        debug!(backend, in_flight = counters.in_flight, "Request started");
        drop(counters);

        RequestGuard {
            monitor: self,
            backend: backend.to_string(),
            started: Instant::now(),
            done: false,
        }
    }

    fn finish(&self, backend: &str, latency: f64, error: Option<String>) {
        let Some(mut counters) = self.backends.get_mut(backend) else {
            return;
        };
        counters.in_flight = counters.in_flight.saturating_sub(1);
        counters.total_latency += latency;
        match error {
            None => {
                counters.completed += 1;
                debug!(backend, latency, "Request completed");
            }
            Some(error) => {
                counters.failed += 1;
                warn!(backend, latency, error = %error, "Request failed");
                counters.last_error = Some(error);
            }
        }
    }

    fn cancel(&self, backend: &str) {
        if let Some(mut counters) = self.backends.get_mut(backend) {
            counters.in_flight = counters.in_flight.saturating_sub(1);
            counters.cancelled += 1;
            debug!(backend, "Request cancelled");
        }
    }

    /// Record a breaker moving from `from` to `to`; equal states are ignored
    pub fn record_circuit_transition(&self, backend: &str, from: CircuitState, to: CircuitState) {
        if from == to {
            return;
        }
        match to {
            CircuitState::Open => warn!(backend, %from, %to, "Circuit state changed"),
            _ => info!(backend, %from, %to, "Circuit state changed"),
        }

        let mut events = self.circuit_events.lock();
        if events.len() == MAX_CIRCUIT_EVENTS {
            events.pop_front();
        }
        events.push_back(CircuitEvent {
            backend: backend.to_string(),
            from,
            to,
            at: Utc::now(),
        });
    }

    pub fn record_cache_event(&self, backend: &str, hit: bool) {
        if hit {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.cache_misses.fetch_add(1, Ordering::Relaxed);
        }
        debug!(backend, hit, "Health cache lookup");
    }

    pub fn backend_stats(&self, backend: &str) -> Option<BackendRequestStats> {
        self.backends.get(backend).map(|c| c.snapshot())
    }

    pub fn active_requests(&self) -> u64 {
        self.backends.iter().map(|c| c.in_flight).sum()
    }

    pub fn status(&self) -> RequestMonitorStatus {
        let mut status = RequestMonitorStatus {
            health_cache_hits: self.cache_hits.load(Ordering::Relaxed),
            health_cache_misses: self.cache_misses.load(Ordering::Relaxed),
            circuit_events: self.circuit_events.lock().iter().rev().cloned().collect(),
            ..Default::default()
        };
        for entry in self.backends.iter() {
            let counters = entry.value();
            status.total_requests += counters.finished() + counters.in_flight + counters.cancelled;
            status.active_requests += counters.in_flight;
            status.total_errors += counters.failed;
            status
                .backends
                .insert(entry.key().clone(), counters.snapshot());
        }
        status
    }
}

/// In-flight marker returned by [`RequestMonitor::start`]
///
/// Dropping it without [`RequestGuard::finish`] counts the request as
/// cancelled.
#[derive(Debug)]
pub struct RequestGuard<'a> {
    monitor: &'a RequestMonitor,
    backend: String,
    started: Instant,
    done: bool,
}

impl RequestGuard<'_> {
    /// Close the request; `error` marks it failed
    pub fn finish(mut self, error: Option<String>) {
        self.done = true;
        let latency = self.started.elapsed().as_secs_f64();
        self.monitor.finish(&self.backend, latency, error);
    }
}

impl Drop for RequestGuard<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.monitor.cancel(&self.backend);
        }
    }
}
