//! Retry mechanism with exponential backoff

use crate::config::models::RetryConfig;
use crate::utils::error::{DispatchError, Result};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry mechanism with exponential backoff and proportional jitter
#[derive(Debug, Clone)]
pub struct RetryHandler {
    config: RetryConfig,
}

impl RetryHandler {
    /// Create a new retry handler
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Backoff before retry number `attempt + 1`, without jitter
    ///
    /// `min(max_delay, base_delay * exponential_base^attempt)`
    pub fn base_delay_for(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = self.config.base_delay.as_secs_f64() * self.config.exponential_base.powi(exponent);
        let max = self.config.max_delay.as_secs_f64();
        Duration::from_secs_f64(if secs.is_finite() { secs.clamp(0.0, max) } else { max })
    }

    /// Backoff before retry number `attempt + 1`
    ///
    /// With jitter enabled the delay is scaled by `1 + r * U(-1, 1)` where
    /// `r` is `jitter_ratio`, then clamped to `[0, max_delay]`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let delay = self.base_delay_for(attempt);
        if !self.config.jitter || self.config.jitter_ratio <= 0.0 {
            return delay;
        }

        let unit: f64 = rand::random::<f64>() * 2.0 - 1.0;
        let scaled = delay.as_secs_f64() * (1.0 + self.config.jitter_ratio * unit);
        Duration::from_secs_f64(scaled.clamp(0.0, self.config.max_delay.as_secs_f64()))
    }

    /// Execute an operation, retrying every error
    pub async fn call<F, Fut, R, E>(&self, f: F) -> Result<R>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<R, E>>,
        E: Display,
    {
        self.call_with(f, |_| true).await
    }

    /// Execute an operation, stopping early on errors `is_retryable` rejects
    ///
    /// Exhaustion is always reported as [`DispatchError::RetryExhausted`]
    /// carrying the number of attempts actually made.
    pub async fn call_with<F, Fut, R, E, P>(&self, mut f: F, is_retryable: P) -> Result<R>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<R, E>>,
        E: Display,
        P: Fn(&E) -> bool,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            match f().await {
                Ok(result) => {
                    if attempt > 1 {
                        debug!(attempt, "Retry succeeded");
                    }
                    return Ok(result);
                }
                Err(error) => {
                    if attempt >= max_attempts || !is_retryable(&error) {
                        warn!(attempts = attempt, error = %error, "Retry exhausted");
                        return Err(DispatchError::RetryExhausted {
                            attempts: attempt,
                            last_error: error.to_string(),
                        });
                    }

                    let delay = self.delay_for(attempt - 1);
                    debug!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "Attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
