//! Pipeline teardown.

use async_trait::async_trait;
use serde_json::json;
use std::fmt;
use std::sync::Arc;

use super::input::service_finder;
use crate::context::{shared, Context, PipelineWorkflow, Shared};
use crate::core::StackType;
use crate::errors::Result;
use crate::events::payload;
use crate::lifecycle::{LifecycleOrchestrator, SubmitPolicy};
use crate::pipeline::{Executor, PipelineBuilder};

struct PipelineTerminator {
    ctx: Context,
    orchestrator: LifecycleOrchestrator,
    state: Shared<PipelineWorkflow>,
}

impl fmt::Debug for PipelineTerminator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineTerminator").finish_non_exhaustive()
    }
}

#[async_trait]
impl Executor for PipelineTerminator {
    fn name(&self) -> &str {
        "terminate-pipeline"
    }

    async fn execute(&self) -> Result<()> {
        let service_name = self.state.read().service_name.clone();
        self.ctx
            .emit(
                "teardown.tier.started",
                payload(
                    format!("Terminating Pipeline '{service_name}' ..."),
                    json!({ "tier": self.name(), "service": service_name }),
                ),
            )
            .await;

        let stack_name = self.ctx.stack_name(StackType::Pipeline, &[service_name.as_str()])?;
        self.orchestrator
            .delete_and_verify(&stack_name, SubmitPolicy::Required)
            .await
    }
}

/// Builds the executor that deletes a service's delivery pipeline.
///
/// An empty `service_name` falls back to the configured service, then the
/// repository name.
#[must_use]
pub fn new_pipeline_terminator(
    ctx: &Context,
    service_name: impl Into<String>,
) -> Arc<dyn Executor> {
    let state = shared(PipelineWorkflow::default());

    let pipeline = PipelineBuilder::new("pipeline-terminate")
        .with_events(ctx.events())
        .step(service_finder(ctx, service_name, state.clone()))
        .step(Arc::new(PipelineTerminator {
            ctx: ctx.clone(),
            orchestrator: LifecycleOrchestrator::from_context(ctx),
            state,
        }))
        .build();

    Arc::new(pipeline)
}
