//! # vision-dispatch
//!
//! Adaptive reliability and selection dispatcher for artwork recognition
//! across interchangeable AI vision backends.
//!
//! ## Features
//!
//! - **Strategy-driven selection**: cost, accuracy, speed, balanced and
//!   adaptive scoring over healthy, constraint-satisfying backends
//! - **Circuit breaking**: per-backend closed/open/half-open guards
//! - **Retry with backoff**: bounded exponential backoff with jitter
//! - **Admission control**: non-blocking token buckets
//! - **Fallback**: ranked candidates are tried in order when one fails
//! - **Health caching**: TTL-bounded, single-flight health probes
//! - **Request monitoring**: per-backend in-flight and failure counters
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vision_dispatch::{Config, Dispatcher, SelectionStrategy, SharedBackend};
//!
//! # async fn run(backends: Vec<SharedBackend>) -> vision_dispatch::Result<()> {
//! let config = Config::from_file("config/dispatcher.yaml").await?;
//! let dispatcher = Dispatcher::builder()
//!     .config(config.dispatcher)
//!     .backends(backends)
//!     .build()?;
//!
//! let image = std::fs::read("starry-night.jpg")?;
//! let outcome = dispatcher
//!     .recognize_artwork_with_reliability(&image, "en", SelectionStrategy::Balanced)
//!     .await?;
//! println!("{:?} via {:?}", outcome.candidates, outcome.model_used);
//! # Ok(())
//! # }
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod config;
pub mod core;
pub mod utils;

// Re-export main types
pub use config::Config;
pub use utils::error::{DispatchError, Result};

pub use core::backend::{
    ArtworkCandidate, BackendAdapter, BackendDescriptor, BackendError, CostModel,
    RecognitionResult, SharedBackend,
};
pub use core::dispatcher::{
    AttemptRecord, Dispatcher, DispatcherBuilder, DispatcherStatus, RecognitionOutcome,
};
pub use core::health::HealthCache;
pub use core::monitoring::{RequestMonitor, RequestMonitorStatus};
pub use core::reliability::{
    Bulkhead, CircuitBreaker, CircuitState, RateLimiter, ReliabilityRegistry, RetryHandler,
    TimeoutWrapper,
};
pub use core::router::{
    LoadBalancer, ModelSelector, RankedModel, SelectionCriteria, SelectionStrategy,
    rank_descriptors,
};

// Version information
/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Name of the crate
pub const NAME: &str = env!("CARGO_PKG_NAME");
