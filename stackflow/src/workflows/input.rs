//! Input steps that populate workflow state before any remote call.

use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::config::ProjectConfig;
use crate::context::{
    Context, DatabaseWorkflow, EnvironmentWorkflow, PipelineWorkflow, ServiceWorkflow, Shared,
};
use crate::core::StackType;
use crate::errors::{InputError, Result};
use crate::events::{payload, EventSink};
use crate::pipeline::{Conditional, Executor, FnConditional};

/// Picks the service name: the explicit one, else the configured service
/// name, else the repository name.
///
/// # Errors
///
/// Returns [`InputError::MissingServiceName`] if all three are empty.
pub fn resolve_service_name(explicit: &str, config: &ProjectConfig) -> Result<String, InputError> {
    [explicit, config.service.name.as_str(), config.repo.name.as_str()]
        .into_iter()
        .find(|name| !name.is_empty())
        .map(str::to_string)
        .ok_or(InputError::MissingServiceName)
}

/// A state record an input step can fill from a resolved service name.
trait ServiceScoped: Send + Sync + 'static {
    fn populate(&mut self, service_name: String, config: &ProjectConfig);
}

impl ServiceScoped for ServiceWorkflow {
    fn populate(&mut self, service_name: String, config: &ProjectConfig) {
        self.service_name = service_name;
        self.repo_name = config.repo.name.clone();
        self.code_revision = config.repo.revision.clone();
        self.app_revision_bucket = config.service.pipeline.build.bucket.clone();
        self.cloudformation_role_arn = config.service.cloudformation_role_arn.clone();
    }
}

impl ServiceScoped for PipelineWorkflow {
    fn populate(&mut self, service_name: String, config: &ProjectConfig) {
        self.service_name = service_name;
        self.repo_name = config.repo.name.clone();
        self.code_revision = config.repo.revision.clone();
        self.app_revision_bucket = config.service.pipeline.build.bucket.clone();
    }
}

impl ServiceScoped for DatabaseWorkflow {
    fn populate(&mut self, service_name: String, config: &ProjectConfig) {
        self.service_name = service_name;
        self.repo_name = config.repo.name.clone();
        self.code_revision = config.repo.revision.clone();
        self.app_revision_bucket = config.service.pipeline.build.bucket.clone();
        self.database_name = config.service.database.name.clone();
        self.cloudformation_role_arn = config.service.cloudformation_role_arn.clone();
        self.database_key_arn = config.service.database_key_arn.clone();
    }
}

struct ServiceInputStep<T> {
    name: &'static str,
    explicit: String,
    config: ProjectConfig,
    events: Arc<dyn EventSink>,
    state: Shared<T>,
}

impl<T: ServiceScoped> ServiceInputStep<T> {
    fn boxed(
        name: &'static str,
        ctx: &Context,
        explicit: impl Into<String>,
        state: Shared<T>,
    ) -> Arc<dyn Executor> {
        Arc::new(Self {
            name,
            explicit: explicit.into(),
            config: ctx.config().clone(),
            events: ctx.events(),
            state,
        })
    }
}

impl<T> fmt::Debug for ServiceInputStep<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceInputStep")
            .field("name", &self.name)
            .field("explicit", &self.explicit)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<T: ServiceScoped> Executor for ServiceInputStep<T> {
    fn name(&self) -> &str {
        self.name
    }

    async fn execute(&self) -> Result<()> {
        let service_name = resolve_service_name(&self.explicit, &self.config)?;
        self.state
            .write()
            .populate(service_name.clone(), &self.config);

        self.events
            .emit(
                "input.resolved",
                Some(payload(
                    format!("Resolved service '{service_name}'"),
                    json!({ "step": self.name, "service": service_name }),
                )),
            )
            .await;
        Ok(())
    }
}

/// Resolves the service name and copies service settings into `state`.
#[must_use]
pub fn service_input(
    ctx: &Context,
    service_name: impl Into<String>,
    state: Shared<ServiceWorkflow>,
) -> Arc<dyn Executor> {
    ServiceInputStep::boxed("service-input", ctx, service_name, state)
}

/// Resolves the service whose pipeline is targeted.
#[must_use]
pub fn service_finder(
    ctx: &Context,
    service_name: impl Into<String>,
    state: Shared<PipelineWorkflow>,
) -> Arc<dyn Executor> {
    ServiceInputStep::boxed("service-finder", ctx, service_name, state)
}

/// Resolves the service and copies its database settings into `state`.
#[must_use]
pub fn database_input(
    ctx: &Context,
    service_name: impl Into<String>,
    state: Shared<DatabaseWorkflow>,
) -> Arc<dyn Executor> {
    ServiceInputStep::boxed("database-input", ctx, service_name, state)
}

/// Stacks an environment owns directly, one of each type.
const ENVIRONMENT_STACKS: [StackType; 5] = [
    StackType::ServiceDiscovery,
    StackType::Cluster,
    StackType::LoadBalancer,
    StackType::Network,
    StackType::Target,
];

#[derive(Clone)]
struct EnvironmentInputStep {
    ctx: Context,
    environment_name: String,
    state: Shared<EnvironmentWorkflow>,
}

impl fmt::Debug for EnvironmentInputStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvironmentInputStep")
            .field("environment_name", &self.environment_name)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Executor for EnvironmentInputStep {
    fn name(&self) -> &str {
        "environment-input"
    }

    async fn execute(&self) -> Result<()> {
        let environment = self.environment_name.as_str();
        if environment.is_empty() {
            return Err(InputError::MissingEnvironmentName.into());
        }
        let stack_names = ENVIRONMENT_STACKS
            .into_iter()
            .map(|stack_type| Ok((stack_type, self.ctx.stack_name(stack_type, &[environment])?)))
            .collect::<Result<HashMap<_, _>>>()?;

        {
            let mut state = self.state.write();
            state.environment_name = environment.to_string();
            state.stack_names = stack_names;
        }

        self.ctx
            .emit(
                "input.resolved",
                payload(
                    format!("Resolved environment '{environment}'"),
                    json!({ "step": self.name(), "environment": environment }),
                ),
            )
            .await;
        Ok(())
    }
}

/// Records the environment name and the names of its stacks in `state`.
///
/// Fails before any remote call when the name is empty or cannot form a
/// valid stack name.
#[must_use]
pub fn environment_input(
    ctx: &Context,
    environment_name: impl Into<String>,
    state: Shared<EnvironmentWorkflow>,
) -> Arc<dyn Executor> {
    Arc::new(EnvironmentInputStep {
        ctx: ctx.clone(),
        environment_name: environment_name.into(),
        state,
    })
}

/// True when the resolved service has a database.
#[must_use]
pub fn has_database(state: Shared<DatabaseWorkflow>) -> Arc<dyn Conditional> {
    Arc::new(FnConditional::new("has-database", move || {
        state.read().has_database()
    }))
}
