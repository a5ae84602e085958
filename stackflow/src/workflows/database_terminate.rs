//! Removing a service's database from one environment.

use async_trait::async_trait;
use serde_json::json;
use std::fmt;
use std::sync::Arc;

use super::input::{database_input, has_database};
use crate::context::{shared, Context, DatabaseWorkflow, Shared};
use crate::core::StackType;
use crate::errors::Result;
use crate::events::payload;
use crate::lifecycle::{LifecycleOrchestrator, SubmitPolicy};
use crate::pipeline::{Executor, PipelineBuilder};

struct DatabaseTerminator {
    ctx: Context,
    orchestrator: LifecycleOrchestrator,
    environment_name: String,
    state: Shared<DatabaseWorkflow>,
}

impl fmt::Debug for DatabaseTerminator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseTerminator")
            .field("environment_name", &self.environment_name)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Executor for DatabaseTerminator {
    fn name(&self) -> &str {
        "terminate-database"
    }

    async fn execute(&self) -> Result<()> {
        let service_name = self.state.read().service_name.clone();
        let environment = &self.environment_name;
        self.ctx
            .emit(
                "teardown.tier.started",
                payload(
                    format!(
                        "Terminating database for service '{service_name}' from environment '{environment}'"
                    ),
                    json!({
                        "tier": self.name(),
                        "service": service_name,
                        "environment": environment,
                    }),
                ),
            )
            .await;

        let stack_name = self
            .ctx
            .stack_name(StackType::Database, &[service_name.as_str(), environment.as_str()])?;
        self.orchestrator
            .delete_and_verify(&stack_name, SubmitPolicy::Required)
            .await
    }
}

/// Builds the executor that deletes a service's database stack.
///
/// The delete only runs when the project configures a database.
#[must_use]
pub fn new_database_terminator(
    ctx: &Context,
    service_name: impl Into<String>,
    environment_name: impl Into<String>,
) -> Arc<dyn Executor> {
    let state = shared(DatabaseWorkflow::default());

    let pipeline = PipelineBuilder::new("database-terminate")
        .with_events(ctx.events())
        .step(database_input(ctx, service_name, state.clone()))
        .guarded_step(
            has_database(state.clone()),
            Arc::new(DatabaseTerminator {
                ctx: ctx.clone(),
                orchestrator: LifecycleOrchestrator::from_context(ctx),
                environment_name: environment_name.into(),
                state,
            }),
        )
        .build();

    Arc::new(pipeline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProjectConfig;
    use crate::events::CollectingEventSink;
    use crate::testing::{database_stack, FakeStackManager, StackCall};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_skipped_without_database() {
        let fake = Arc::new(FakeStackManager::new());
        let sink = Arc::new(CollectingEventSink::new());
        let ctx = Context::new(ProjectConfig::new(), fake.clone()).with_events(sink.clone());

        new_database_terminator(&ctx, "orders", "dev")
            .execute()
            .await
            .unwrap();

        assert!(fake.calls().is_empty());
        assert_eq!(sink.events_of_type("pipeline.step.skipped").len(), 1);
    }

    #[tokio::test]
    async fn test_deletes_configured_database() {
        let fake = Arc::new(FakeStackManager::new());
        fake.add_stack(
            StackType::Database,
            database_stack("stackflow-database-orders-dev", "dev", "orders"),
        );
        let ctx = Context::new(
            ProjectConfig::new().with_database_name("ordersdb"),
            fake.clone(),
        );

        new_database_terminator(&ctx, "orders", "dev")
            .execute()
            .await
            .unwrap();

        assert_eq!(
            fake.calls(),
            vec![
                StackCall::Delete("stackflow-database-orders-dev".into()),
                StackCall::Await("stackflow-database-orders-dev".into()),
            ]
        );
    }
}
