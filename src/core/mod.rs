//! Core functionality for the dispatcher
//!
//! This module contains the backend capability, the reliability primitives,
//! health tracking, request monitoring, selection and the dispatcher that
//! composes them.

pub mod backend;
pub mod dispatcher;
pub mod health;
pub mod monitoring;
pub mod reliability;
pub mod router;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use backend::{
    ArtworkCandidate, BackendAdapter, BackendDescriptor, BackendError, CostModel,
    RecognitionResult, SharedBackend,
};
pub use dispatcher::{Dispatcher, DispatcherBuilder, DispatcherStatus, RecognitionOutcome};
pub use router::{SelectionCriteria, SelectionStrategy};
