//! Stack lifecycle orchestration.
//!
//! This module provides:
//! - [`LifecycleOrchestrator`]: delete-and-verify and undeploy-if-present
//! - [`DeletionBatch`]: submit-all-then-await-all teardown of independent stacks

mod batch;
mod orchestrator;

pub use batch::{BatchOutcome, DeletionBatch, PendingDeletion};
pub use orchestrator::{verify_terminal, LifecycleOrchestrator, SubmitPolicy};
