//! Reliability components
//!
//! - **circuit_breaker**: per-backend closed/open/half-open guard
//! - **retry**: bounded exponential backoff around a single call
//! - **rate_limiter**: non-blocking token bucket admission
//! - **resilience**: bulkhead and timeout wrappers
//! - **registry**: lazily created, name-keyed instances

pub mod circuit_breaker;
pub mod rate_limiter;
pub mod registry;
pub mod resilience;
pub mod retry;
pub mod types;

pub use circuit_breaker::CircuitBreaker;
pub use rate_limiter::RateLimiter;
pub use registry::{BACKEND_BUCKET_PREFIX, ReliabilityRegistry};
pub use resilience::{Bulkhead, TimeoutWrapper};
pub use retry::RetryHandler;
pub use types::{CircuitBreakerSnapshot, CircuitState, RateLimiterStatus};
