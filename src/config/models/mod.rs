//! Configuration data models
//!
//! This module defines all configuration structures used by the dispatcher.

pub mod dispatcher;
pub mod health;
pub mod monitoring;
pub mod rate_limit;
pub mod reliability;
pub mod router;

// Re-export all configuration types
pub use dispatcher::*;
pub use health::*;
pub use monitoring::*;
pub use rate_limit::*;
pub use reliability::*;
pub use router::*;

/// Default for boolean flags that are on unless disabled
pub fn default_true() -> bool {
    true
}
