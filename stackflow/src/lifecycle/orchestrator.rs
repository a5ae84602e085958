//! Delete-and-verify for single stacks.
//!
//! Observed per stack:
//!
//! ```text
//! ABSENT --delete--> IN_PROGRESS --await--> SUCCEEDED | FAILED
//! ```
//!
//! `ABSENT` and `SUCCEEDED` both satisfy a teardown.

use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;

use crate::client::{StackDeleter, StackWaiter};
use crate::context::Context;
use crate::core::{Stack, StackObservation};
use crate::errors::{Result, StackflowError};
use crate::events::{payload, EventSink};

/// How a rejected delete request is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmitPolicy {
    /// A rejected request fails the step.
    #[default]
    Required,
    /// A rejected request is logged and the stack is awaited anyway.
    BestEffort,
}

/// Checks the result of an await against the success suffix.
///
/// # Errors
///
/// Returns [`StackflowError::TerminalFailure`] if the stack exists and its
/// status does not end in `_COMPLETE`.
pub fn verify_terminal(stack_name: &str, stack: Option<&Stack>) -> Result<()> {
    match stack {
        Some(stack) if !stack.phase().is_success() => Err(StackflowError::terminal_failure(
            stack_name,
            &stack.status,
            &stack.status_reason,
        )),
        _ => Ok(()),
    }
}

/// Turns delete requests into verified terminal outcomes.
#[derive(Clone)]
pub struct LifecycleOrchestrator {
    deleter: Arc<dyn StackDeleter>,
    waiter: Arc<dyn StackWaiter>,
    events: Arc<dyn EventSink>,
}

impl LifecycleOrchestrator {
    /// Creates an orchestrator from explicit capabilities.
    #[must_use]
    pub fn new(
        deleter: Arc<dyn StackDeleter>,
        waiter: Arc<dyn StackWaiter>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            deleter,
            waiter,
            events,
        }
    }

    /// Creates an orchestrator using the context's clients and sink.
    #[must_use]
    pub fn from_context(ctx: &Context) -> Self {
        Self::new(
            ctx.stacks().deleter.clone(),
            ctx.stacks().waiter.clone(),
            ctx.events(),
        )
    }

    pub(crate) async fn emit(&self, event_type: &str, data: Value) {
        self.events.emit(event_type, Some(data)).await;
    }

    /// Submits a delete request.
    ///
    /// # Errors
    ///
    /// Returns the client error under [`SubmitPolicy::Required`]; never fails
    /// under [`SubmitPolicy::BestEffort`].
    pub async fn submit_delete(&self, stack_name: &str, policy: SubmitPolicy) -> Result<()> {
        match self.deleter.delete_stack(stack_name).await {
            Ok(()) => {
                self.events
                    .emit(
                        "stack.delete.submitted",
                        Some(payload(
                            format!("Deleting stack '{stack_name}'"),
                            json!({ "stack": stack_name }),
                        )),
                    )
                    .await;
                Ok(())
            }
            Err(err) if policy == SubmitPolicy::BestEffort => {
                self.events
                    .emit(
                        "stack.delete.ignored",
                        Some(payload(
                            format!("Unable to delete '{stack_name}', but ignoring error: {err}"),
                            json!({ "stack": stack_name, "error": err.to_string() }),
                        )),
                    )
                    .await;
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Blocks until the stack settles and reports what was observed.
    pub async fn await_terminal(&self, stack_name: &str) -> Option<Stack> {
        let stack = self.waiter.await_final_status(stack_name).await;
        let observation = StackObservation::of(stack.as_ref());

        let (event_type, message) = match &stack {
            None => ("stack.absent", format!("Stack '{stack_name}' does not exist")),
            Some(s) => (
                "stack.terminal",
                format!("Stack '{stack_name}' settled in {}", s.status),
            ),
        };
        self.events
            .emit(
                event_type,
                Some(payload(
                    message,
                    json!({
                        "stack": stack_name,
                        "observation": observation,
                        "status": stack.as_ref().map(|s| s.status.clone()),
                    }),
                )),
            )
            .await;

        stack
    }

    /// Deletes a stack and waits for it to settle successfully.
    ///
    /// A stack that no longer exists counts as deleted.
    ///
    /// # Errors
    ///
    /// Returns a submission error (unless `policy` is best-effort) or a
    /// terminal failure carrying the final status and reason.
    pub async fn delete_and_verify(&self, stack_name: &str, policy: SubmitPolicy) -> Result<()> {
        self.submit_delete(stack_name, policy).await?;
        let stack = self.await_terminal(stack_name).await;
        verify_terminal(stack_name, stack.as_ref())
    }

    /// Deletes a stack only if it exists.
    ///
    /// The existence check is itself an await, so a stack in the middle of an
    /// operation is allowed to settle first.
    ///
    /// # Errors
    ///
    /// Same as [`Self::delete_and_verify`] with [`SubmitPolicy::Required`].
    pub async fn undeploy_if_present(&self, stack_name: &str) -> Result<()> {
        if self.waiter.await_final_status(stack_name).await.is_none() {
            self.events
                .emit(
                    "stack.absent",
                    Some(payload(
                        "  Stack is already deleted.",
                        json!({ "stack": stack_name }),
                    )),
                )
                .await;
            return Ok(());
        }

        self.delete_and_verify(stack_name, SubmitPolicy::Required).await
    }
}

impl fmt::Debug for LifecycleOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleOrchestrator").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{MockStackDeleter, MockStackWaiter};
    use crate::errors::{StackClientError, StackOperation};
    use crate::events::CollectingEventSink;
    use mockall::predicate::eq;
    use mockall::Sequence;

    fn orchestrator(
        deleter: MockStackDeleter,
        waiter: MockStackWaiter,
    ) -> (LifecycleOrchestrator, Arc<CollectingEventSink>) {
        let sink = Arc::new(CollectingEventSink::new());
        let orch = LifecycleOrchestrator::new(Arc::new(deleter), Arc::new(waiter), sink.clone());
        (orch, sink)
    }

    fn rejected(name: &str) -> StackClientError {
        StackClientError::api(StackOperation::Delete, name, "rejected")
    }

    #[test]
    fn test_verify_terminal() {
        assert!(verify_terminal("s", None).is_ok());
        assert!(verify_terminal("s", Some(&Stack::new("s", "DELETE_COMPLETE"))).is_ok());

        let failed = Stack::new("s", "DELETE_FAILED").with_status_reason("in use");
        let err = verify_terminal("s", Some(&failed)).unwrap_err();
        assert_eq!(err.to_string(), "Ended in failed status DELETE_FAILED in use");
    }

    #[tokio::test]
    async fn test_delete_and_verify_success() {
        let mut seq = Sequence::new();
        let mut deleter = MockStackDeleter::new();
        let mut waiter = MockStackWaiter::new();
        deleter
            .expect_delete_stack()
            .with(eq("stackflow-cluster-dev"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        waiter
            .expect_await_final_status()
            .with(eq("stackflow-cluster-dev"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|name| Some(Stack::new(name, "DELETE_COMPLETE")));

        let (orch, sink) = orchestrator(deleter, waiter);
        orch.delete_and_verify("stackflow-cluster-dev", SubmitPolicy::Required)
            .await
            .unwrap();

        assert_eq!(
            sink.event_types(),
            vec!["stack.delete.submitted", "stack.terminal"]
        );
    }

    #[tokio::test]
    async fn test_delete_and_verify_absent_after_delete() {
        let mut deleter = MockStackDeleter::new();
        let mut waiter = MockStackWaiter::new();
        deleter.expect_delete_stack().returning(|_| Ok(()));
        waiter.expect_await_final_status().returning(|_| None);

        let (orch, _) = orchestrator(deleter, waiter);
        assert!(orch
            .delete_and_verify("gone", SubmitPolicy::Required)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_delete_and_verify_terminal_failure() {
        let mut deleter = MockStackDeleter::new();
        let mut waiter = MockStackWaiter::new();
        deleter.expect_delete_stack().returning(|_| Ok(()));
        waiter.expect_await_final_status().returning(|name| {
            Some(Stack::new(name, "DELETE_FAILED").with_status_reason("dependency"))
        });

        let (orch, _) = orchestrator(deleter, waiter);
        let err = orch
            .delete_and_verify("stuck", SubmitPolicy::Required)
            .await
            .unwrap_err();

        match err {
            StackflowError::TerminalFailure {
                stack,
                status,
                reason,
            } => {
                assert_eq!(stack, "stuck");
                assert_eq!(status, "DELETE_FAILED");
                assert_eq!(reason, "dependency");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_required_submission_failure_skips_await() {
        let mut deleter = MockStackDeleter::new();
        let mut waiter = MockStackWaiter::new();
        deleter
            .expect_delete_stack()
            .returning(|name| Err(rejected(name)));
        waiter.expect_await_final_status().never();

        let (orch, _) = orchestrator(deleter, waiter);
        let err = orch
            .delete_and_verify("locked", SubmitPolicy::Required)
            .await
            .unwrap_err();
        assert!(err.is_submission());
    }

    #[tokio::test]
    async fn test_best_effort_submission_failure_still_awaits() {
        let mut deleter = MockStackDeleter::new();
        let mut waiter = MockStackWaiter::new();
        deleter
            .expect_delete_stack()
            .returning(|name| Err(rejected(name)));
        waiter
            .expect_await_final_status()
            .times(1)
            .returning(|_| None);

        let (orch, sink) = orchestrator(deleter, waiter);
        orch.delete_and_verify("vpc", SubmitPolicy::BestEffort)
            .await
            .unwrap();

        assert_eq!(sink.event_types(), vec!["stack.delete.ignored", "stack.absent"]);
    }

    #[tokio::test]
    async fn test_best_effort_terminal_failure_still_fails() {
        let mut deleter = MockStackDeleter::new();
        let mut waiter = MockStackWaiter::new();
        deleter
            .expect_delete_stack()
            .returning(|name| Err(rejected(name)));
        waiter
            .expect_await_final_status()
            .returning(|name| Some(Stack::new(name, "DELETE_FAILED")));

        let (orch, _) = orchestrator(deleter, waiter);
        let err = orch
            .delete_and_verify("vpc", SubmitPolicy::BestEffort)
            .await
            .unwrap_err();
        assert!(err.is_terminal_failure());
    }

    #[tokio::test]
    async fn test_undeploy_if_present_absent() {
        let mut deleter = MockStackDeleter::new();
        let mut waiter = MockStackWaiter::new();
        deleter.expect_delete_stack().never();
        waiter
            .expect_await_final_status()
            .times(1)
            .returning(|_| None);

        let (orch, sink) = orchestrator(deleter, waiter);
        orch.undeploy_if_present("acme-service-checkout-dev")
            .await
            .unwrap();

        assert_eq!(sink.messages(), vec!["  Stack is already deleted."]);
    }

    #[tokio::test]
    async fn test_undeploy_if_present_existing() {
        let mut seq = Sequence::new();
        let mut deleter = MockStackDeleter::new();
        let mut waiter = MockStackWaiter::new();
        waiter
            .expect_await_final_status()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|name| Some(Stack::new(name, "UPDATE_COMPLETE")));
        deleter
            .expect_delete_stack()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        waiter
            .expect_await_final_status()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|name| Some(Stack::new(name, "DELETE_COMPLETE")));

        let (orch, _) = orchestrator(deleter, waiter);
        orch.undeploy_if_present("acme-service-checkout-dev")
            .await
            .unwrap();
    }
}
