//! Removing one service from one environment.

use async_trait::async_trait;
use serde_json::json;
use std::fmt;
use std::sync::Arc;

use super::input::service_input;
use crate::context::{shared, Context, ServiceWorkflow, Shared};
use crate::core::StackType;
use crate::errors::Result;
use crate::events::payload;
use crate::lifecycle::LifecycleOrchestrator;
use crate::pipeline::{Executor, PipelineBuilder};

struct ServiceUndeployer {
    ctx: Context,
    orchestrator: LifecycleOrchestrator,
    environment_name: String,
    state: Shared<ServiceWorkflow>,
}

impl fmt::Debug for ServiceUndeployer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceUndeployer")
            .field("environment_name", &self.environment_name)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Executor for ServiceUndeployer {
    fn name(&self) -> &str {
        "undeploy-service"
    }

    async fn execute(&self) -> Result<()> {
        let service_name = self.state.read().service_name.clone();
        let environment = &self.environment_name;
        self.ctx
            .emit(
                "teardown.tier.started",
                payload(
                    format!("Undeploying service '{service_name}' from '{environment}'"),
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
            .stack_name(StackType::Service, &[service_name.as_str(), environment.as_str()])?;
        self.orchestrator.undeploy_if_present(&stack_name).await
    }
}

/// Builds the executor that removes a service's stack from an environment,
/// if it is deployed there.
#[must_use]
pub fn new_service_undeployer(
    ctx: &Context,
    service_name: impl Into<String>,
    environment_name: impl Into<String>,
) -> Arc<dyn Executor> {
    let state = shared(ServiceWorkflow::default());

    let pipeline = PipelineBuilder::new("service-undeploy")
        .with_events(ctx.events())
        .step(service_input(ctx, service_name, state.clone()))
        .step(Arc::new(ServiceUndeployer {
            ctx: ctx.clone(),
            orchestrator: LifecycleOrchestrator::from_context(ctx),
            environment_name: environment_name.into(),
            state,
        }))
        .build();

    Arc::new(pipeline)
}
