//! Stack fixtures.

use crate::core::{Stack, ENVIRONMENT_TAG, SERVICE_TAG};

/// A stack with the given status.
#[must_use]
pub fn stack(name: impl Into<String>, status: impl Into<String>) -> Stack {
    Stack::new(name, status)
}

/// A deployed service stack tagged with its environment and service.
#[must_use]
pub fn service_stack(name: impl Into<String>, environment: &str, service: &str) -> Stack {
    Stack::new(name, "CREATE_COMPLETE")
        .with_tag(ENVIRONMENT_TAG, environment)
        .with_tag(SERVICE_TAG, service)
}

/// A database stack tagged with its environment and owning service.
#[must_use]
pub fn database_stack(name: impl Into<String>, environment: &str, service: &str) -> Stack {
    service_stack(name, environment, service).with_parameter("DatabaseName", service)
}

/// A cluster stack exporting the outputs the viewer reads.
#[must_use]
pub fn cluster_stack(name: impl Into<String>, environment: &str) -> Stack {
    Stack::new(name, "CREATE_COMPLETE")
        .with_tag(ENVIRONMENT_TAG, environment)
        .with_output("BaseUrl", format!("https://{environment}.example.com"))
        .with_output("VpcId", "vpc-0123")
        .with_output("EcsCluster", format!("{environment}-cluster"))
}
