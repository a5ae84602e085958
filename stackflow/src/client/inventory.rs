//! Cluster, instance and task inventory, read by the environment viewer.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::StackClientError;

/// A container host registered with a cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerInstance {
    /// Backing EC2 instance id.
    pub ec2_instance_id: String,
    /// Agent status.
    pub status: String,
    /// Whether the agent is connected.
    pub agent_connected: bool,
    /// Number of running tasks.
    pub running_tasks_count: i64,
    /// Attributes such as availability zone, instance type and AMI.
    #[serde(default)]
    pub attributes: HashMap<String, String>,
    /// Remaining capacity by resource name (`CPU`, `MEMORY`).
    #[serde(default)]
    pub remaining_resources: HashMap<String, i64>,
}

/// A compute instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    /// Instance id.
    pub instance_id: String,
    /// Private IP address.
    pub private_ip_address: String,
}

/// A running task belonging to a service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Task id.
    pub task_id: String,
    /// Environment the task runs in.
    pub environment: String,
    /// Service the task belongs to.
    pub service: String,
    /// Last reported status.
    pub status: String,
    /// Container names.
    #[serde(default)]
    pub containers: Vec<String>,
}

/// Lists container instances in a cluster.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClusterInstanceLister: Send + Sync {
    /// Returns the container instances of the named cluster.
    async fn list_cluster_instances(
        &self,
        cluster_name: &str,
    ) -> Result<Vec<ContainerInstance>, StackClientError>;
}

/// Looks up compute instances by id.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InstanceLister: Send + Sync {
    /// Returns the instances with the given ids.
    async fn list_instances(&self, ids: &[String]) -> Result<Vec<Instance>, StackClientError>;
}

/// Lists tasks of a service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskLister: Send + Sync {
    /// Returns the tasks of a service in an environment.
    async fn list_tasks(
        &self,
        environment: &str,
        service: &str,
    ) -> Result<Vec<Task>, StackClientError>;
}

/// The inventory collaborators the viewer needs.
#[derive(Clone)]
pub struct Inventory {
    /// Cluster instance listing.
    pub cluster_instances: Arc<dyn ClusterInstanceLister>,
    /// Instance listing.
    pub instances: Arc<dyn InstanceLister>,
    /// Task listing.
    pub tasks: Arc<dyn TaskLister>,
}

impl Inventory {
    /// Builds an inventory from a single client implementing every capability.
    pub fn from_client<C>(client: Arc<C>) -> Self
    where
        C: ClusterInstanceLister + InstanceLister + TaskLister + 'static,
    {
        Self {
            cluster_instances: client.clone(),
            instances: client.clone(),
            tasks: client,
        }
    }
}

impl std::fmt::Debug for Inventory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inventory").finish_non_exhaustive()
    }
}
