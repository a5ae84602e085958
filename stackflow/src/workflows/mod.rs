//! Composed workflows.
//!
//! Each constructor takes its dependencies explicitly and returns one
//! [`crate::pipeline::Executor`] meant to be invoked once:
//!
//! - [`new_environment_terminator`]: tiered teardown of a whole environment
//! - [`new_pipeline_terminator`]: deletes a service's delivery pipeline
//! - [`new_service_undeployer`]: removes a service from an environment
//! - [`new_database_terminator`]: removes a service's database from an environment
//! - [`new_environment_viewer`]: writes a report about an environment

mod database_terminate;
mod environment_terminate;
mod environment_view;
mod input;
mod integration_tests;
mod pipeline_terminate;
mod service_undeploy;

pub use database_terminate::new_database_terminator;
pub use environment_terminate::{new_environment_terminator, TeardownTier};
pub use environment_view::{new_environment_viewer, ViewFormat};
pub use input::{
    database_input, environment_input, has_database, resolve_service_name, service_finder,
    service_input,
};
pub use pipeline_terminate::new_pipeline_terminator;
pub use service_undeploy::new_service_undeployer;
