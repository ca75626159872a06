//! Common test utilities for vision-dispatch
//!
//! - Scripted backends implementing `BackendAdapter`
//! - Fixtures for backend sets and fast test configuration
//!
//! # Usage
//!
//! ```rust
//! use crate::common::{backends::ScriptedBackend, fixtures};
//!
//! #[tokio::test]
//! async fn my_test() {
//!     let backend = ScriptedBackend::new("gpt-4o", "openai").cost(0.01).shared();
//!     let dispatcher = fixtures::dispatcher(fixtures::test_config(), &[backend]);
//!     // ...
//! }
//! ```

pub mod backends;
pub mod fixtures;

// Re-export commonly used items
pub use backends::ScriptedBackend;
pub use fixtures::{dispatcher, gallery, test_config};
