//! Utility modules for the dispatcher
//!
//! - **error**: crate-wide error type and result alias
//! - **logging**: tracing subscriber setup
//! - **serde_helpers**: duration (de)serialisation for configuration

pub mod error;
pub mod logging;
pub mod serde_helpers;

pub use error::{DispatchError, Result};

use uuid::Uuid;

/// Generate a unique request ID
pub fn generate_request_id() -> String {
    Uuid::new_v4().to_string()
}
