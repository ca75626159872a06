//! Non-blocking token bucket rate limiter
//!
//! A denied acquisition fails immediately; callers are expected to back off.

use super::types::RateLimiterStatus;
use crate::config::models::RateLimitConfig;
use crate::utils::error::{DispatchError, Result};
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// Token bucket for a single service
#[derive(Debug)]
pub struct RateLimiter {
    service: String,
    config: RateLimitConfig,
    bucket: Mutex<Bucket>,
}

impl RateLimiter {
    /// Create a limiter with a full bucket
    pub fn new(service: impl Into<String>, config: RateLimitConfig) -> Self {
        let tokens = f64::from(config.burst_allowance);
        Self {
            service: service.into(),
            config,
            bucket: Mutex::new(Bucket {
                tokens,
                last_refill: Instant::now(),
            }),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Consume one token or fail with [`DispatchError::RateLimitExceeded`]
    pub fn acquire(&self) -> Result<()> {
        if self.try_acquire() {
            Ok(())
        } else {
            warn!(service = %self.service, "Rate limit exceeded");
            Err(DispatchError::RateLimitExceeded {
                service: self.service.clone(),
                requests_per_minute: self.config.requests_per_minute,
            })
        }
    }

    /// Consume one token if available
    pub fn try_acquire(&self) -> bool {
        if !self.config.enabled {
            return true;
        }

        let mut bucket = self.bucket.lock();
        self.refill(&mut bucket);

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            debug!(
                service = %self.service,
                tokens = bucket.tokens,
                "No token available"
            );
            false
        }
    }

    fn refill(&self, bucket: &mut Bucket) {
        let now = Instant::now();
        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        let capacity = f64::from(self.config.burst_allowance);
        bucket.tokens = (bucket.tokens + elapsed * self.config.refill_rate()).min(capacity);
        bucket.last_refill = now;
    }

    /// Tokens currently available, after lazy refill
    pub fn available_tokens(&self) -> f64 {
        let mut bucket = self.bucket.lock();
        self.refill(&mut bucket);
        bucket.tokens
    }

    pub fn status(&self) -> RateLimiterStatus {
        RateLimiterStatus::new(&self.service, &self.config, self.available_tokens())
    }
}
