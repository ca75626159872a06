//! Backend health tracking
//!
//! - `cache` - TTL-bounded, single-flight cache of health probe results
//! - `types` - Cache entries and status snapshots

pub mod cache;
pub mod types;

pub use cache::HealthCache;
pub use types::{HealthCacheStatus, HealthEntry, HealthEntryStatus};
