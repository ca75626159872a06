//! Integration tests for vision-dispatch
//!
//! These tests drive the public API end to end with scripted backends.

pub mod config_validation_tests;
pub mod dispatcher_tests;
