//! # Stackflow
//!
//! Workflow orchestration for layered cloud infrastructure stacks.
//!
//! An environment is a set of stacks (network, cluster, load balancer,
//! service discovery, databases, services) that depend on each other.
//! Stackflow composes the operations on them into fail-fast pipelines:
//!
//! - **Executors and conditionals**: small units of work and their guards
//! - **Pipelines**: sequential, fail-fast, with skippable guarded steps
//! - **Stack lifecycle**: delete-and-verify against terminal statuses
//! - **Tiered teardown**: dependency-ordered, with batched same-tier deletes
//! - **Event sinks**: every workflow message goes through an injected sink
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stackflow::prelude::*;
//!
//! let ctx = Context::new(ProjectConfig::from_path("stackflow.json")?, client);
//! new_environment_terminator(&ctx, "dev").execute().await?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod client;
pub mod config;
pub mod context;
pub mod core;
pub mod errors;
pub mod events;
pub mod lifecycle;
pub mod observability;
pub mod pipeline;
pub mod testing;
pub mod workflows;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::client::{
        Inventory, StackDeleter, StackGetter, StackLister, StackManager, StackWaiter,
    };
    pub use crate::config::{LoggingConfig, ProjectConfig};
    pub use crate::context::{Context, StackClients};
    pub use crate::core::{create_stack_name, Stack, StackObservation, StackPhase, StackType};
    pub use crate::errors::{Result, StackClientError, StackflowError};
    pub use crate::events::{EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::lifecycle::{DeletionBatch, LifecycleOrchestrator, SubmitPolicy};
    pub use crate::pipeline::{Conditional, Executor, Pipeline, PipelineBuilder};
    pub use crate::workflows::{
        new_database_terminator, new_environment_terminator, new_environment_viewer,
        new_pipeline_terminator, new_service_undeployer, ViewFormat,
    };
}
