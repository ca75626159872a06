//! Resilience patterns for resource isolation and timeout protection

use crate::utils::error::{DispatchError, Result};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

/// Timeout wrapper for async operations
#[derive(Debug, Clone, Copy)]
pub struct TimeoutWrapper {
    timeout: Duration,
}

impl TimeoutWrapper {
    /// Create a new timeout wrapper
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Execute a future with timeout protection
    ///
    /// On elapse the future is dropped, cancelling whatever it was awaiting.
    pub async fn call<F, R>(&self, f: F) -> Result<R>
    where
        F: Future<Output = R>,
    {
        match tokio::time::timeout(self.timeout, f).await {
            Ok(result) => Ok(result),
            Err(_) => Err(DispatchError::Timeout(format!(
                "Operation timed out after {:?}",
                self.timeout
            ))),
        }
    }
}

/// Bulkhead pattern for resource isolation
#[derive(Debug)]
pub struct Bulkhead {
    semaphore: Arc<Semaphore>,
    name: String,
    max_concurrent: usize,
}

impl Bulkhead {
    /// Create a new bulkhead
    pub fn new(name: impl Into<String>, max_concurrent: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            name: name.into(),
            max_concurrent,
        }
    }

    /// Wait for a permit; it is released when dropped
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| DispatchError::Internal(format!("Bulkhead acquire failed: {}", e)))?;

        debug!(bulkhead = %self.name, "Bulkhead acquired permit");
        Ok(permit)
    }

    /// Get available permits
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Get maximum concurrent operations
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }
}
