//! Circuit breaker implementation for fault tolerance
//!
//! One breaker guards one backend. All bookkeeping lives behind a single
//! mutex per breaker that is never held across an await point, so contention
//! on one backend never blocks another.

use super::types::{CircuitBreakerSnapshot, CircuitState};
use crate::config::models::CircuitBreakerConfig;
use crate::utils::error::{DispatchError, Result};
use parking_lot::Mutex;
use std::future::Future;
use tokio::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    failure_count: u32,
    success_count: u32,
    half_open_calls: u32,
    opened_at: Option<Instant>,
    /// Bumped on every transition; outcomes from an older generation are dropped
    generation: u64,
}

impl BreakerState {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            success_count: 0,
            half_open_calls: 0,
            opened_at: None,
            generation: 0,
        }
    }

    fn transition(&mut self, state: CircuitState) {
        self.state = state;
        self.generation += 1;
    }
}

/// Circuit breaker implementation
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerState>,
}

/// Admission ticket for a single protected call
///
/// Dropping a probe ticket without an outcome (the call was cancelled)
/// hands its half-open slot back.
struct CallPermit<'a> {
    breaker: &'a CircuitBreaker,
    generation: u64,
    probe: bool,
    settled: bool,
}

impl CallPermit<'_> {
    fn success(mut self) {
        self.settled = true;
        self.breaker.on_success(self.generation);
    }

    fn failure(mut self) {
        self.settled = true;
        self.breaker.on_failure(self.generation);
    }
}

impl Drop for CallPermit<'_> {
    fn drop(&mut self) {
        if self.probe && !self.settled {
            self.breaker.release_probe(self.generation);
        }
    }
}

impl CircuitBreaker {
    /// Create a new circuit breaker
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            inner: Mutex::new(BreakerState::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Execute a future with circuit breaker protection
    ///
    /// Errors from the future are returned unchanged after being counted.
    pub async fn call<F, R>(&self, f: F) -> Result<R>
    where
        F: Future<Output = Result<R>>,
    {
        let permit = self.admit()?;

        match f.await {
            Ok(result) => {
                permit.success();
                Ok(result)
            }
            Err(error) => {
                permit.failure();
                Err(error)
            }
        }
    }

    /// Check whether a call may proceed, moving OPEN to HALF_OPEN once the
    /// recovery timeout has elapsed
    fn admit(&self) -> Result<CallPermit<'_>> {
        let mut inner = self.inner.lock();

        if inner.state == CircuitState::Open {
            let recovered = inner
                .opened_at
                .is_some_and(|at| at.elapsed() >= self.config.recovery_timeout);
            if !recovered {
                debug!(backend = %self.name, "Circuit breaker open, failing fast");
                return Err(self.open_error(inner.failure_count));
            }
            debug!(backend = %self.name, "Circuit breaker transitioning from Open to HalfOpen");
            inner.transition(CircuitState::HalfOpen);
            inner.success_count = 0;
            inner.half_open_calls = 0;
        }

        let probe = inner.state == CircuitState::HalfOpen;
        if probe {
            if inner.half_open_calls >= self.config.half_open_max_calls {
                debug!(backend = %self.name, "Half-open probe slots exhausted");
                return Err(self.open_error(inner.failure_count));
            }
            inner.half_open_calls += 1;
        }

        Ok(CallPermit {
            breaker: self,
            generation: inner.generation,
            probe,
            settled: false,
        })
    }

    fn on_success(&self, generation: u64) {
        let mut inner = self.inner.lock();
        if inner.generation != generation {
            return;
        }

        match inner.state {
            CircuitState::Closed => {
                inner.failure_count = 0;
            }
            CircuitState::HalfOpen => {
                inner.success_count += 1;
                if inner.success_count >= self.config.success_threshold {
                    info!(backend = %self.name, "Circuit breaker closed after successful probes");
                    inner.transition(CircuitState::Closed);
                    inner.failure_count = 0;
                    inner.success_count = 0;
                    inner.half_open_calls = 0;
                    inner.opened_at = None;
                }
            }
            CircuitState::Open => {}
        }
    }

    fn on_failure(&self, generation: u64) {
        let mut inner = self.inner.lock();
        if inner.generation != generation {
            return;
        }

        match inner.state {
            CircuitState::Closed => {
                inner.failure_count += 1;
                if inner.failure_count >= self.config.failure_threshold {
                    warn!(
                        backend = %self.name,
                        failures = inner.failure_count,
                        "Circuit breaker opening"
                    );
                    inner.transition(CircuitState::Open);
                    inner.opened_at = Some(Instant::now());
                }
            }
            CircuitState::HalfOpen => {
                warn!(backend = %self.name, "Probe failed, circuit breaker reopening");
                inner.transition(CircuitState::Open);
                inner.failure_count += 1;
                inner.success_count = 0;
                inner.half_open_calls = 0;
                inner.opened_at = Some(Instant::now());
            }
            CircuitState::Open => {}
        }
    }

    fn release_probe(&self, generation: u64) {
        let mut inner = self.inner.lock();
        if inner.generation == generation && inner.state == CircuitState::HalfOpen {
            inner.half_open_calls = inner.half_open_calls.saturating_sub(1);
            debug!(backend = %self.name, "Cancelled probe released its slot");
        }
    }

    fn open_error(&self, failure_count: u32) -> DispatchError {
        DispatchError::CircuitOpen {
            name: self.name.clone(),
            failure_count,
        }
    }

    /// Get current circuit breaker state
    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    /// Get current counters
    pub fn snapshot(&self) -> CircuitBreakerSnapshot {
        let inner = self.inner.lock();
        CircuitBreakerSnapshot {
            name: self.name.clone(),
            state: inner.state,
            failure_count: inner.failure_count,
            success_count: inner.success_count,
            half_open_calls: inner.half_open_calls,
            opened_seconds_ago: inner.opened_at.map(|at| at.elapsed().as_secs_f64()),
            config: self.config.clone(),
        }
    }

    /// Reset the circuit breaker
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        let generation = inner.generation;
        *inner = BreakerState::new();
        inner.generation = generation + 1;
        debug!(backend = %self.name, "Circuit breaker reset");
    }
}
