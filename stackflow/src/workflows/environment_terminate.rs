//! Environment teardown across dependency-ordered tiers.
//!
//! Tiers run in [`TeardownTier::ORDER`]. Within the service and database
//! tiers every matching stack is submitted for deletion before any of them is
//! awaited; the remaining tiers hold a single stack each (two for the network).

use async_trait::async_trait;
use serde_json::json;
use std::fmt;
use std::sync::Arc;

use super::input::environment_input;
use crate::context::{shared, Context, EnvironmentWorkflow, Shared};
use crate::core::{StackType, SERVICE_TAG};
use crate::errors::Result;
use crate::events::payload;
use crate::lifecycle::{DeletionBatch, LifecycleOrchestrator, PendingDeletion, SubmitPolicy};
use crate::pipeline::{Executor, PipelineBuilder};

/// One stage of environment teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TeardownTier {
    /// Application services deployed into the environment.
    Services,
    /// Databases owned by those services.
    Databases,
    /// The consul stack.
    ServiceDiscovery,
    /// The compute cluster.
    Cluster,
    /// The load balancer.
    LoadBalancer,
    /// The VPC, then its auxiliary target stack.
    Network,
}

impl TeardownTier {
    /// Execution order. A tier only starts once every earlier tier finished.
    pub const ORDER: [Self; 6] = [
        Self::Services,
        Self::Databases,
        Self::ServiceDiscovery,
        Self::Cluster,
        Self::LoadBalancer,
        Self::Network,
    ];

    /// Returns the step name used for this tier.
    #[must_use]
    pub const fn step_name(self) -> &'static str {
        match self {
            Self::Services => "terminate-services",
            Self::Databases => "terminate-databases",
            Self::ServiceDiscovery => "terminate-consul",
            Self::Cluster => "terminate-cluster",
            Self::LoadBalancer => "terminate-loadbalancer",
            Self::Network => "terminate-network",
        }
    }

    /// Returns the stack types removed by this tier, in deletion order.
    #[must_use]
    pub const fn stack_types(self) -> &'static [StackType] {
        match self {
            Self::Services => &[StackType::Service],
            Self::Databases => &[StackType::Database],
            Self::ServiceDiscovery => &[StackType::ServiceDiscovery],
            Self::Cluster => &[StackType::Cluster],
            Self::LoadBalancer => &[StackType::LoadBalancer],
            Self::Network => &[StackType::Network, StackType::Target],
        }
    }

    fn banner(self, environment: &str) -> String {
        match self {
            Self::Services => format!("Terminating Services for environment '{environment}' ..."),
            Self::Databases => format!("Terminating Databases for environment '{environment}' ..."),
            Self::ServiceDiscovery => format!("Terminating Consul environment '{environment}' ..."),
            Self::Cluster => format!("Terminating ECS environment '{environment}' ..."),
            Self::LoadBalancer => format!("Terminating ELB environment '{environment}' ..."),
            Self::Network => format!("Terminating VPC environment '{environment}' ..."),
        }
    }

    fn await_message(self, service: &str, environment: &str) -> String {
        match self {
            Self::Databases => format!(
                "   Terminating database for service '{service}' from environment '{environment}'"
            ),
            _ => format!("   Undeploying service '{service}' from environment '{environment}'"),
        }
    }
}

/// Executes one teardown tier for the environment recorded in `state`.
struct TierTerminator {
    tier: TeardownTier,
    ctx: Context,
    orchestrator: LifecycleOrchestrator,
    state: Shared<EnvironmentWorkflow>,
}

impl TierTerminator {
    fn new(tier: TeardownTier, ctx: &Context, state: Shared<EnvironmentWorkflow>) -> Self {
        Self {
            tier,
            ctx: ctx.clone(),
            orchestrator: LifecycleOrchestrator::from_context(ctx),
            state,
        }
    }

    /// Lists the tier's stacks, keeps those tagged with the environment and
    /// deletes them as one batch. Failed terminal statuses are only reported.
    async fn terminate_batched(&self, environment: &str) -> Result<()> {
        let mut batch = DeletionBatch::new();
        for stack_type in self.tier.stack_types() {
            let stacks = self.ctx.stacks().lister.list_stacks(*stack_type).await?;
            batch.extend(
                stacks
                    .into_iter()
                    .filter(|s| s.belongs_to_environment(environment))
                    .map(|s| {
                        let message = self
                            .tier
                            .await_message(s.tag(SERVICE_TAG).unwrap_or_default(), environment);
                        PendingDeletion::new(s.name, message)
                    }),
            );
        }

        batch.run(&self.orchestrator).await?;
        Ok(())
    }

    /// Deletes the tier's stacks by the names the input step resolved.
    async fn terminate_single(&self, environment: &str, policy: SubmitPolicy) -> Result<()> {
        let stack_names = {
            let state = self.state.read();
            self.tier
                .stack_types()
                .iter()
                .map(|stack_type| match state.stack_name(*stack_type) {
                    Some(name) => Ok(name.to_string()),
                    None => self.ctx.stack_name(*stack_type, &[environment]),
                })
                .collect::<std::result::Result<Vec<_>, _>>()?
        };

        for stack_name in &stack_names {
            self.orchestrator
                .delete_and_verify(stack_name, policy)
                .await?;
        }
        Ok(())
    }
}

impl fmt::Debug for TierTerminator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TierTerminator")
            .field("tier", &self.tier)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Executor for TierTerminator {
    fn name(&self) -> &str {
        self.tier.step_name()
    }

    async fn execute(&self) -> Result<()> {
        let environment = self.state.read().environment_name.clone();

        self.ctx
            .emit(
                "teardown.tier.started",
                payload(
                    self.tier.banner(&environment),
                    json!({ "tier": self.tier.step_name(), "environment": environment }),
                ),
            )
            .await;

        match self.tier {
            TeardownTier::Services | TeardownTier::Databases => {
                self.terminate_batched(&environment).await
            }
            TeardownTier::ServiceDiscovery | TeardownTier::Cluster | TeardownTier::LoadBalancer => {
                self.terminate_single(&environment, SubmitPolicy::Required)
                    .await
            }
            TeardownTier::Network => {
                self.terminate_single(&environment, SubmitPolicy::BestEffort)
                    .await
            }
        }
    }
}

/// Builds the executor that tears down every stack of an environment.
#[must_use]
pub fn new_environment_terminator(
    ctx: &Context,
    environment_name: impl Into<String>,
) -> Arc<dyn Executor> {
    let state = shared(EnvironmentWorkflow::default());

    let builder = PipelineBuilder::new("environment-terminate")
        .with_events(ctx.events())
        .step(environment_input(ctx, environment_name, state.clone()));

    let pipeline = TeardownTier::ORDER.into_iter().fold(builder, |b, tier| {
        b.step(Arc::new(TierTerminator::new(tier, ctx, state.clone())))
    });

    Arc::new(pipeline.build())
}
