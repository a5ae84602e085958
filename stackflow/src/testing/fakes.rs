//! In-memory clients with call recording.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use crate::client::{
    ClusterInstanceLister, ContainerInstance, Instance, InstanceLister, Inventory, StackDeleter,
    StackGetter, StackLister, StackWaiter, Task, TaskLister,
};
use crate::core::{Stack, StackType};
use crate::errors::{StackClientError, StackOperation};

/// A call made against a [`FakeStackManager`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StackCall {
    /// `list_stacks`
    List(StackType),
    /// `get_stack`
    Get(String),
    /// `delete_stack`
    Delete(String),
    /// `await_final_status`
    Await(String),
}

impl StackCall {
    /// Returns the stack name the call targeted, if any.
    #[must_use]
    pub fn stack_name(&self) -> Option<&str> {
        match self {
            Self::List(_) => None,
            Self::Get(name) | Self::Delete(name) | Self::Await(name) => Some(name),
        }
    }

    /// Returns true for delete calls.
    #[must_use]
    pub fn is_delete(call: &Self) -> bool {
        matches!(call, Self::Delete(_))
    }

    /// Returns true for await calls.
    #[must_use]
    pub fn is_await(call: &Self) -> bool {
        matches!(call, Self::Await(_))
    }

    /// Returns true for delete or await calls on the given stack.
    #[must_use]
    pub fn touches(&self, stack_name: &str) -> bool {
        matches!(self, Self::Delete(_) | Self::Await(_)) && self.stack_name() == Some(stack_name)
    }
}

#[derive(Debug, Clone)]
struct StoredStack {
    stack_type: StackType,
    stack: Stack,
    deleting: bool,
}

#[derive(Debug, Default)]
struct FakeState {
    stacks: Vec<StoredStack>,
    calls: Vec<StackCall>,
    failing_deletes: HashSet<String>,
    failing_gets: HashSet<String>,
    failing_lists: HashSet<StackType>,
    final_statuses: HashMap<String, (String, String)>,
}

impl FakeState {
    fn position(&self, name: &str) -> Option<usize> {
        self.stacks.iter().position(|s| s.stack.name == name)
    }
}

/// A stack manager backed by memory.
///
/// A delete marks the stack as deleting. The next await on it removes it and
/// returns it with `DELETE_COMPLETE`, or with the status set through
/// [`FakeStackManager::set_final_status`] (in which case the stack stays).
/// Stacks that are not deleting are returned as they are.
#[derive(Debug, Default)]
pub struct FakeStackManager {
    state: Mutex<FakeState>,
    await_latency: Option<Duration>,
}

impl FakeStackManager {
    /// Creates an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every await sleep before answering.
    #[must_use]
    pub fn with_await_latency(mut self, latency: Duration) -> Self {
        self.await_latency = Some(latency);
        self
    }

    /// Adds a stack of the given type.
    pub fn add_stack(&self, stack_type: StackType, stack: Stack) {
        let mut state = self.state.lock();
        if let Some(pos) = state.position(&stack.name) {
            state.stacks.remove(pos);
        }
        state.stacks.push(StoredStack {
            stack_type,
            stack,
            deleting: false,
        });
    }

    /// Makes delete requests for `name` fail.
    pub fn fail_delete(&self, name: impl Into<String>) {
        self.state.lock().failing_deletes.insert(name.into());
    }

    /// Makes get requests for `name` fail.
    pub fn fail_get(&self, name: impl Into<String>) {
        self.state.lock().failing_gets.insert(name.into());
    }

    /// Makes listings of `stack_type` fail.
    pub fn fail_list(&self, stack_type: StackType) {
        self.state.lock().failing_lists.insert(stack_type);
    }

    /// Sets the status a deleting stack settles in.
    pub fn set_final_status(
        &self,
        name: impl Into<String>,
        status: impl Into<String>,
        reason: impl Into<String>,
    ) {
        self.state
            .lock()
            .final_statuses
            .insert(name.into(), (status.into(), reason.into()));
    }

    /// Returns every call in the order it was made.
    #[must_use]
    pub fn calls(&self) -> Vec<StackCall> {
        self.state.lock().calls.clone()
    }

    /// Returns the delete and await calls touching one stack.
    #[must_use]
    pub fn calls_for(&self, stack_name: &str) -> Vec<StackCall> {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.touches(stack_name))
            .cloned()
            .collect()
    }

    /// Returns the names passed to `delete_stack`, in order.
    #[must_use]
    pub fn deleted(&self) -> Vec<String> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                StackCall::Delete(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    /// Returns true if a stack is still stored under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.state.lock().position(name).is_some()
    }

    /// Forgets recorded calls.
    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    fn record(&self, call: StackCall) {
        self.state.lock().calls.push(call);
    }
}

#[async_trait]
impl StackLister for FakeStackManager {
    async fn list_stacks(&self, stack_type: StackType) -> Result<Vec<Stack>, StackClientError> {
        let mut state = self.state.lock();
        state.calls.push(StackCall::List(stack_type));
        if state.failing_lists.contains(&stack_type) {
            return Err(StackClientError::api(
                StackOperation::List,
                stack_type.slug(),
                "listing failed",
            ));
        }
        Ok(state
            .stacks
            .iter()
            .filter(|s| s.stack_type == stack_type)
            .map(|s| s.stack.clone())
            .collect())
    }
}

#[async_trait]
impl StackGetter for FakeStackManager {
    async fn get_stack(&self, name: &str) -> Result<Option<Stack>, StackClientError> {
        let mut state = self.state.lock();
        state.calls.push(StackCall::Get(name.to_string()));
        if state.failing_gets.contains(name) {
            return Err(StackClientError::api(StackOperation::Get, name, "lookup failed"));
        }
        Ok(state.position(name).map(|pos| state.stacks[pos].stack.clone()))
    }
}

#[async_trait]
impl StackDeleter for FakeStackManager {
    async fn delete_stack(&self, name: &str) -> Result<(), StackClientError> {
        let mut state = self.state.lock();
        state.calls.push(StackCall::Delete(name.to_string()));
        if state.failing_deletes.contains(name) {
            return Err(StackClientError::api(
                StackOperation::Delete,
                name,
                "request rejected",
            ));
        }
        if let Some(pos) = state.position(name) {
            let stored = &mut state.stacks[pos];
            stored.deleting = true;
            stored.stack.status = "DELETE_IN_PROGRESS".to_string();
        }
        Ok(())
    }
}

#[async_trait]
impl StackWaiter for FakeStackManager {
    async fn await_final_status(&self, name: &str) -> Option<Stack> {
        self.record(StackCall::Await(name.to_string()));
        if let Some(latency) = self.await_latency {
            tokio::time::sleep(latency).await;
        }

        let mut state = self.state.lock();
        let pos = state.position(name)?;
        if !state.stacks[pos].deleting {
            return Some(state.stacks[pos].stack.clone());
        }

        match state.final_statuses.get(name).cloned() {
            Some((status, reason)) => {
                let stored = &mut state.stacks[pos];
                stored.deleting = false;
                stored.stack.status = status;
                stored.stack.status_reason = reason;
                Some(stored.stack.clone())
            }
            None => {
                let mut stack = state.stacks.remove(pos).stack;
                stack.status = "DELETE_COMPLETE".to_string();
                Some(stack)
            }
        }
    }
}

/// An inventory backed by memory.
#[derive(Debug, Default)]
pub struct FakeInventory {
    cluster_instances: Mutex<HashMap<String, Vec<ContainerInstance>>>,
    instances: Mutex<Vec<Instance>>,
    tasks: Mutex<Vec<Task>>,
}

impl FakeInventory {
    /// Creates an empty inventory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a container instance with a cluster.
    pub fn add_cluster_instance(&self, cluster_name: impl Into<String>, ci: ContainerInstance) {
        self.cluster_instances
            .lock()
            .entry(cluster_name.into())
            .or_default()
            .push(ci);
    }

    /// Adds a compute instance.
    pub fn add_instance(&self, instance: Instance) {
        self.instances.lock().push(instance);
    }

    /// Adds a task.
    pub fn add_task(&self, task: Task) {
        self.tasks.lock().push(task);
    }

    /// Wraps this inventory for the viewer.
    #[must_use]
    pub fn into_inventory(self) -> Inventory {
        Inventory::from_client(Arc::new(self))
    }
}

#[async_trait]
impl ClusterInstanceLister for FakeInventory {
    async fn list_cluster_instances(
        &self,
        cluster_name: &str,
    ) -> Result<Vec<ContainerInstance>, StackClientError> {
        Ok(self
            .cluster_instances
            .lock()
            .get(cluster_name)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl InstanceLister for FakeInventory {
    async fn list_instances(&self, ids: &[String]) -> Result<Vec<Instance>, StackClientError> {
        Ok(self
            .instances
            .lock()
            .iter()
            .filter(|i| ids.contains(&i.instance_id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TaskLister for FakeInventory {
    async fn list_tasks(
        &self,
        environment: &str,
        service: &str,
    ) -> Result<Vec<Task>, StackClientError> {
        Ok(self
            .tasks
            .lock()
            .iter()
            .filter(|t| t.environment == environment && t.service == service)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_delete_then_await_removes_stack() {
        let fake = FakeStackManager::new();
        fake.add_stack(StackType::Cluster, Stack::new("c", "CREATE_COMPLETE"));

        fake.delete_stack("c").await.unwrap();
        let settled = fake.await_final_status("c").await.unwrap();

        assert_eq!(settled.status, "DELETE_COMPLETE");
        assert!(!fake.contains("c"));
        assert!(fake.await_final_status("c").await.is_none());
    }

    #[tokio::test]
    async fn test_await_without_delete_returns_current_stack() {
        let fake = FakeStackManager::new();
        fake.add_stack(StackType::Service, Stack::new("s", "UPDATE_COMPLETE"));

        let current = fake.await_final_status("s").await.unwrap();

        assert_eq!(current.status, "UPDATE_COMPLETE");
        assert!(fake.contains("s"));
    }

    #[tokio::test]
    async fn test_final_status_override_keeps_stack() {
        let fake = FakeStackManager::new();
        fake.add_stack(StackType::Database, Stack::new("db", "CREATE_COMPLETE"));
        fake.set_final_status("db", "DELETE_FAILED", "busy");

        fake.delete_stack("db").await.unwrap();
        let settled = fake.await_final_status("db").await.unwrap();

        assert_eq!(settled.status, "DELETE_FAILED");
        assert_eq!(settled.status_reason, "busy");
        assert!(fake.contains("db"));
    }

    #[tokio::test]
    async fn test_failures_are_recorded() {
        let fake = FakeStackManager::new();
        fake.fail_delete("x");
        fake.fail_get("y");
        fake.fail_list(StackType::Service);

        assert!(fake.delete_stack("x").await.is_err());
        assert!(fake.get_stack("y").await.is_err());
        assert!(fake.list_stacks(StackType::Service).await.is_err());
        assert_eq!(
            fake.calls(),
            vec![
                StackCall::Delete("x".into()),
                StackCall::Get("y".into()),
                StackCall::List(StackType::Service),
            ]
        );
    }

    #[tokio::test]
    async fn test_list_filters_by_type() {
        let fake = FakeStackManager::new();
        fake.add_stack(StackType::Service, Stack::new("s", "CREATE_COMPLETE"));
        fake.add_stack(StackType::Database, Stack::new("d", "CREATE_COMPLETE"));

        let services = fake.list_stacks(StackType::Service).await.unwrap();

        assert_eq!(services.len(), 1);
        assert_eq!(services[0].name, "s");
    }

    #[tokio::test]
    async fn test_inventory_filters() {
        let inv = FakeInventory::new();
        inv.add_instance(Instance {
            instance_id: "i-1".into(),
            private_ip_address: "10.0.0.1".into(),
        });
        inv.add_task(Task {
            task_id: "t-1".into(),
            environment: "dev".into(),
            service: "web".into(),
            ..Task::default()
        });

        assert_eq!(inv.list_instances(&["i-1".to_string()]).await.unwrap().len(), 1);
        assert!(inv.list_instances(&["i-2".to_string()]).await.unwrap().is_empty());
        assert_eq!(inv.list_tasks("dev", "web").await.unwrap().len(), 1);
        assert!(inv.list_tasks("prod", "web").await.unwrap().is_empty());
        assert!(inv.list_cluster_instances("c").await.unwrap().is_empty());
    }
}
