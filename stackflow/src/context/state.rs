//! Per-feature workflow state.
//!
//! A state record is created by a workflow constructor, filled in by the
//! pipeline's input step and read by the steps after it. It belongs to a
//! single pipeline invocation; the lock only exists because several step
//! objects hold the same record.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::core::StackType;

/// State shared between the steps of one pipeline.
pub type Shared<T> = Arc<RwLock<T>>;

/// Wraps a state record for sharing between steps.
#[must_use]
pub fn shared<T>(value: T) -> Shared<T> {
    Arc::new(RwLock::new(value))
}

/// State for environment workflows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentWorkflow {
    /// The environment being operated on.
    pub environment_name: String,
    /// Names of the environment's own stacks, resolved by the input step.
    pub stack_names: HashMap<StackType, String>,
}

impl EnvironmentWorkflow {
    /// Returns the resolved name of the environment's `stack_type` stack.
    #[must_use]
    pub fn stack_name(&self, stack_type: StackType) -> Option<&str> {
        self.stack_names.get(&stack_type).map(String::as_str)
    }
}

/// State for pipeline workflows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineWorkflow {
    /// The service whose pipeline is targeted.
    pub service_name: String,
    /// Source repository name.
    pub repo_name: String,
    /// Source revision.
    pub code_revision: String,
    /// Artifact bucket.
    pub app_revision_bucket: String,
}

/// State for service workflows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceWorkflow {
    /// The service being operated on.
    pub service_name: String,
    /// Source repository name.
    pub repo_name: String,
    /// Source revision.
    pub code_revision: String,
    /// Artifact bucket.
    pub app_revision_bucket: String,
    /// Role assumed by the stack provider.
    pub cloudformation_role_arn: String,
}

/// State for database workflows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatabaseWorkflow {
    /// The service owning the database.
    pub service_name: String,
    /// Source repository name.
    pub repo_name: String,
    /// Source revision.
    pub code_revision: String,
    /// Artifact bucket.
    pub app_revision_bucket: String,
    /// Database name; empty when the service has none.
    pub database_name: String,
    /// Role assumed by the stack provider.
    pub cloudformation_role_arn: String,
    /// Key protecting database credentials.
    pub database_key_arn: String,
}

impl DatabaseWorkflow {
    /// Returns true if a database is configured.
    #[must_use]
    pub fn has_database(&self) -> bool {
        !self.database_name.is_empty()
    }
}
