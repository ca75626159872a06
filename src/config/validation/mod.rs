//! Configuration validation
//!
//! Each configuration structure implements [`Validate`]; errors are plain
//! strings that [`crate::config::Config::validate`] wraps into
//! [`crate::utils::error::DispatchError::Config`].

mod config_validators;
mod router_validators;
mod trait_def;


pub use config_validators::validate_backends;
pub use router_validators::MIN_RECOVERY_TIMEOUT;
pub use trait_def::Validate;
