//! Submit-all-then-await-all deletion of independent stacks.
//!
//! Every delete in a batch is submitted before the first await, so the
//! provider can work on all of them at once while this side stays sequential.

use serde_json::json;

use super::{LifecycleOrchestrator, SubmitPolicy};
use crate::core::{StackObservation, StackPhase};
use crate::errors::Result;
use crate::events::payload;

/// One stack waiting to be deleted as part of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDeletion {
    /// Stack to delete.
    pub stack_name: String,
    /// Message emitted before awaiting this stack.
    pub message: String,
}

impl PendingDeletion {
    /// Creates a pending deletion.
    #[must_use]
    pub fn new(stack_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            stack_name: stack_name.into(),
            message: message.into(),
        }
    }
}

/// What an await observed for one batch entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Stack name.
    pub stack_name: String,
    /// Observation after the await.
    pub observation: StackObservation,
    /// Final status, if the stack still existed.
    pub status: Option<String>,
    /// Final status reason, if the stack still existed.
    pub reason: Option<String>,
}

impl BatchOutcome {
    /// Returns true if the stack ended absent or complete.
    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.observation.is_torn_down()
    }
}

/// An ordered list of independent deletions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionBatch {
    entries: Vec<PendingDeletion>,
}

impl DeletionBatch {
    /// Creates an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a deletion.
    pub fn push(&mut self, entry: PendingDeletion) {
        self.entries.push(entry);
    }

    /// Returns the entries in submission order.
    #[must_use]
    pub fn entries(&self) -> &[PendingDeletion] {
        &self.entries
    }

    /// Returns the stack names in submission order.
    #[must_use]
    pub fn stack_names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.stack_name.as_str()).collect()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the batch has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Submits every delete in order.
    ///
    /// # Errors
    ///
    /// Stops at and returns the first rejected request.
    pub async fn submit_all(&self, orchestrator: &LifecycleOrchestrator) -> Result<()> {
        for entry in &self.entries {
            orchestrator
                .submit_delete(&entry.stack_name, SubmitPolicy::Required)
                .await?;
        }
        Ok(())
    }

    /// Awaits every entry in order and reports what each ended as.
    ///
    /// Failed terminal statuses are reported through events and outcomes, not
    /// as errors.
    pub async fn await_all(&self, orchestrator: &LifecycleOrchestrator) -> Vec<BatchOutcome> {
        let mut outcomes = Vec::with_capacity(self.entries.len());

        for entry in &self.entries {
            orchestrator
                .emit(
                    "teardown.stack.awaited",
                    payload(entry.message.clone(), json!({ "stack": entry.stack_name })),
                )
                .await;

            let stack = orchestrator.await_terminal(&entry.stack_name).await;
            let observation = StackObservation::of(stack.as_ref());

            if observation == StackObservation::Present(StackPhase::Failed) {
                let (status, reason) = stack
                    .as_ref()
                    .map(|s| (s.status.as_str(), s.status_reason.as_str()))
                    .unwrap_or_default();
                orchestrator
                    .emit(
                        "teardown.stack.failed",
                        payload(
                            format!(
                                "Stack '{}' ended in failed status {status} {reason}",
                                entry.stack_name
                            ),
                            json!({
                                "stack": entry.stack_name,
                                "status": status,
                                "reason": reason,
                            }),
                        ),
                    )
                    .await;
            }

            outcomes.push(BatchOutcome {
                stack_name: entry.stack_name.clone(),
                observation,
                status: stack.as_ref().map(|s| s.status.clone()),
                reason: stack.map(|s| s.status_reason),
            });
        }

        outcomes
    }

    /// Submits every delete, then awaits every entry.
    ///
    /// # Errors
    ///
    /// Returns the first rejected delete request; awaits are not attempted.
    pub async fn run(&self, orchestrator: &LifecycleOrchestrator) -> Result<Vec<BatchOutcome>> {
        self.submit_all(orchestrator).await?;
        Ok(self.await_all(orchestrator).await)
    }
}

impl FromIterator<PendingDeletion> for DeletionBatch {
    fn from_iter<I: IntoIterator<Item = PendingDeletion>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl Extend<PendingDeletion> for DeletionBatch {
    fn extend<I: IntoIterator<Item = PendingDeletion>>(&mut self, iter: I) {
        self.entries.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Stack, StackType};
    use crate::events::CollectingEventSink;
    use crate::testing::{assert_all_before, FakeStackManager, StackCall};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn setup(fake: &Arc<FakeStackManager>) -> (LifecycleOrchestrator, Arc<CollectingEventSink>) {
        let sink = Arc::new(CollectingEventSink::new());
        let orch = LifecycleOrchestrator::new(fake.clone(), fake.clone(), sink.clone());
        (orch, sink)
    }

    fn batch(names: &[&str]) -> DeletionBatch {
        names
            .iter()
            .map(|n| PendingDeletion::new(*n, format!("Deleting {n}")))
            .collect()
    }

    #[tokio::test]
    async fn test_all_submits_precede_awaits() {
        let fake = Arc::new(FakeStackManager::new());
        fake.add_stack(StackType::Service, Stack::new("a", "CREATE_COMPLETE"));
        fake.add_stack(StackType::Service, Stack::new("b", "CREATE_COMPLETE"));
        fake.add_stack(StackType::Service, Stack::new("c", "CREATE_COMPLETE"));
        let (orch, _) = setup(&fake);

        let outcomes = batch(&["a", "b", "c"]).run(&orch).await.unwrap();

        assert_eq!(
            fake.calls(),
            vec![
                StackCall::Delete("a".into()),
                StackCall::Delete("b".into()),
                StackCall::Delete("c".into()),
                StackCall::Await("a".into()),
                StackCall::Await("b".into()),
                StackCall::Await("c".into()),
            ]
        );
        assert_all_before(&fake.calls(), StackCall::is_delete, StackCall::is_await);
        assert!(outcomes.iter().all(BatchOutcome::is_torn_down));
    }

    #[tokio::test]
    async fn test_rejected_submit_aborts_before_awaits() {
        let fake = Arc::new(FakeStackManager::new());
        fake.fail_delete("b");
        let (orch, _) = setup(&fake);

        let err = batch(&["a", "b", "c"]).run(&orch).await.unwrap_err();

        assert!(err.is_submission());
        assert_eq!(
            fake.calls(),
            vec![StackCall::Delete("a".into()), StackCall::Delete("b".into())]
        );
    }

    #[tokio::test]
    async fn test_failed_terminal_status_is_reported_not_raised() {
        let fake = Arc::new(FakeStackManager::new());
        fake.add_stack(StackType::Database, Stack::new("db", "CREATE_COMPLETE"));
        fake.set_final_status("db", "DELETE_FAILED", "snapshot in progress");
        let (orch, sink) = setup(&fake);

        let outcomes = batch(&["db"]).run(&orch).await.unwrap();

        assert_eq!(
            outcomes,
            vec![BatchOutcome {
                stack_name: "db".into(),
                observation: StackObservation::Present(StackPhase::Failed),
                status: Some("DELETE_FAILED".into()),
                reason: Some("snapshot in progress".into()),
            }]
        );
        assert_eq!(sink.events_of_type("teardown.stack.failed").len(), 1);
    }

    #[tokio::test]
    async fn test_empty_batch_makes_no_calls() {
        let fake = Arc::new(FakeStackManager::new());
        let (orch, _) = setup(&fake);

        let outcomes = DeletionBatch::new().run(&orch).await.unwrap();

        assert!(outcomes.is_empty());
        assert!(fake.calls().is_empty());
    }
}
