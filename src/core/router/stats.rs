//! Rolling per-backend outcome statistics

use serde::Serialize;
use std::collections::VecDeque;

/// Helper trait for bounded VecDeque operations
trait BoundedPush<T> {
    fn push_bounded(&mut self, value: T, max_size: usize);
}

impl<T> BoundedPush<T> for VecDeque<T> {
    /// Push a value while maintaining a maximum size (O(1) amortized)
    #[inline]
    fn push_bounded(&mut self, value: T, max_size: usize) {
        while self.len() >= max_size.max(1) {
            self.pop_front();
        }
        self.push_back(value);
    }
}

/// Outcome statistics for one backend
#[derive(Debug, Clone)]
pub struct ModelStats {
    total_requests: u64,
    successes: u64,
    failures: u64,
    total_response_time: f64,
    timed_samples: u64,
    recent: VecDeque<f64>,
    window: usize,
}

impl ModelStats {
    /// Stats keeping the `window` most recent response times
    pub fn new(window: usize) -> Self {
        Self {
            total_requests: 0,
            successes: 0,
            failures: 0,
            total_response_time: 0.0,
            timed_samples: 0,
            recent: VecDeque::with_capacity(window.min(1024)),
            window,
        }
    }

    /// Record one completed call
    pub fn record(&mut self, success: bool, response_time: f64) {
        self.total_requests += 1;
        if success {
            self.successes += 1;
        } else {
            self.failures += 1;
        }

        if response_time.is_finite() && response_time >= 0.0 {
            self.total_response_time += response_time;
            self.timed_samples += 1;
            self.recent.push_bounded(response_time, self.window);
        }
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests
    }

    pub fn success_rate(&self) -> f64 {
        if self.total_requests == 0 {
            return 0.0;
        }
        self.successes as f64 / self.total_requests as f64
    }

    /// Lifetime mean over calls with a usable response time
    pub fn average_response_time(&self) -> f64 {
        if self.timed_samples == 0 {
            return 0.0;
        }
        self.total_response_time / self.timed_samples as f64
    }

    /// Mean over the ring buffer only
    pub fn recent_avg_response_time(&self) -> f64 {
        if self.recent.is_empty() {
            return 0.0;
        }
        self.recent.iter().sum::<f64>() / self.recent.len() as f64
    }

    pub fn snapshot(&self) -> ModelStatsSnapshot {
        ModelStatsSnapshot {
            total_requests: self.total_requests,
            successful_requests: self.successes,
            failed_requests: self.failures,
            success_rate: self.success_rate(),
            average_response_time: self.average_response_time(),
            recent_avg_response_time: self.recent_avg_response_time(),
            recent_samples: self.recent.len(),
        }
    }
}

/// Serialisable view of [`ModelStats`]
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct ModelStatsSnapshot {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub success_rate: f64,
    pub average_response_time: f64,
    pub recent_avg_response_time: f64,
    pub recent_samples: usize,
}
