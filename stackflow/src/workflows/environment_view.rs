//! Environment inspection.
//!
//! The JSON view prints the environment's base URL. The CLI view prints the
//! environment's stacks, container instances, services and tasks as plain
//! text tables.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::io::Write;
use std::sync::Arc;

use crate::client::{ContainerInstance, Instance, Inventory, StackGetter, StackLister};
use crate::context::Context;
use crate::core::{Stack, StackType, SERVICE_TAG};
use crate::errors::{Result, StackClientError, StackOperation};
use crate::pipeline::{Executor, PipelineBuilder};

const BASE_URL_KEY: &str = "BaseUrl";
const BASTION_HOST_KEY: &str = "BastionHost";
const ECS_CLUSTER_KEY: &str = "EcsCluster";
const IMAGE_URL_PARAM: &str = "ImageUrl";
const VERSION_TAG: &str = "version";
const AZ_ATTRIBUTE: &str = "ecs.availability-zone";
const INSTANCE_TYPE_ATTRIBUTE: &str = "ecs.instance-type";
const AMI_ATTRIBUTE: &str = "ecs.ami-id";
const UNKNOWN: &str = "?";

/// Output format of the environment viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewFormat {
    /// Machine readable summary.
    Json,
    /// Human readable report.
    #[default]
    Cli,
}

#[derive(Debug, Serialize)]
struct JsonOutput<'a> {
    values: Vec<JsonValue<'a>>,
}

#[derive(Debug, Serialize)]
struct JsonValue<'a> {
    key: &'a str,
    value: &'a str,
}

struct EnvironmentViewer<W> {
    ctx: Context,
    format: ViewFormat,
    environment_name: String,
    inventory: Inventory,
    writer: Arc<Mutex<W>>,
}

impl<W> fmt::Debug for EnvironmentViewer<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvironmentViewer")
            .field("format", &self.format)
            .field("environment_name", &self.environment_name)
            .finish_non_exhaustive()
    }
}

async fn environment_services(lister: &dyn StackLister, environment: &str) -> Result<Vec<Stack>> {
    Ok(lister
        .list_stacks(StackType::Service)
        .await?
        .into_iter()
        .filter(|s| s.belongs_to_environment(environment))
        .collect())
}

/// Fetches a stack the view cannot do without.
async fn require_stack(getter: &dyn StackGetter, name: &str) -> Result<Stack> {
    getter
        .get_stack(name)
        .await?
        .ok_or_else(|| StackClientError::api(StackOperation::Get, name, "stack not found").into())
}

impl<W: Write + Send + 'static> EnvironmentViewer<W> {
    fn stack_name(&self, stack_type: StackType) -> Result<String> {
        Ok(self
            .ctx
            .stack_name(stack_type, &[self.environment_name.as_str()])?)
    }

    async fn render_json(&self) -> Result<String> {
        let getter = self.ctx.stacks().getter.as_ref();
        let cluster = require_stack(getter, &self.stack_name(StackType::Cluster)?).await?;

        let output = JsonOutput {
            values: vec![JsonValue {
                key: BASE_URL_KEY,
                value: cluster.output(BASE_URL_KEY),
            }],
        };
        let mut rendered = serde_json::to_string(&output)?;
        rendered.push('\n');
        Ok(rendered)
    }

    async fn render_cli(&self) -> Result<String> {
        let environment = self.environment_name.as_str();
        let getter = self.ctx.stacks().getter.as_ref();

        let lb = require_stack(getter, &self.stack_name(StackType::LoadBalancer)?).await?;
        let cluster = require_stack(getter, &self.stack_name(StackType::Cluster)?).await?;
        // Environments may run in a network this tool does not manage.
        let vpc = getter
            .get_stack(&self.stack_name(StackType::Network)?)
            .await
            .ok()
            .flatten();

        let mut out = String::new();
        out.push_str(&header_line("Environment", environment));
        out.push_str(&stack_line("Cluster Stack", &cluster));
        match &vpc {
            None => out.push_str(&header_line("VPC Stack", "unmanaged")),
            Some(vpc) => {
                out.push_str(&stack_line("VPC Stack", vpc));
                out.push_str(&header_line("Bastion Host", vpc.output(BASTION_HOST_KEY)));
            }
        }
        out.push_str(&header_line("Base URL", lb.output(BASE_URL_KEY)));

        let container_instances = self
            .inventory
            .cluster_instances
            .list_cluster_instances(cluster.output(ECS_CLUSTER_KEY))
            .await?;
        let ids: Vec<String> = container_instances
            .iter()
            .map(|ci| ci.ec2_instance_id.clone())
            .collect();
        let instances = self.inventory.instances.list_instances(&ids).await?;

        out.push_str("\nContainer Instances:\n\n");
        out.push_str(&instance_table(&container_instances, &instances));

        let services = environment_services(self.ctx.stacks().lister.as_ref(), environment).await?;

        out.push_str("\nServices:\n\n");
        out.push_str(&service_table(&services));

        for service in &services {
            let service_name = service.tag(SERVICE_TAG).unwrap_or_default();
            let tasks = self
                .inventory
                .tasks
                .list_tasks(environment, service_name)
                .await?;
            let rows: Vec<Vec<String>> = tasks
                .into_iter()
                .map(|t| vec![t.task_id, t.status, t.containers.join(",")])
                .collect();
            out.push_str(&format!("\nTasks for '{service_name}':\n\n"));
            out.push_str(&render_table(&["Task", "Status", "Containers"], &rows));
        }

        out.push('\n');
        Ok(out)
    }
}

#[async_trait]
impl<W: Write + Send + 'static> Executor for EnvironmentViewer<W> {
    fn name(&self) -> &str {
        "view-environment"
    }

    async fn execute(&self) -> Result<()> {
        let rendered = match self.format {
            ViewFormat::Json => self.render_json().await?,
            ViewFormat::Cli => self.render_cli().await?,
        };

        let mut writer = self.writer.lock();
        writer.write_all(rendered.as_bytes())?;
        writer.flush()?;
        Ok(())
    }
}

fn header_line(header: &str, value: &str) -> String {
    format!("{:<16}{value}\n", format!("{header}:"))
}

fn stack_line(header: &str, stack: &Stack) -> String {
    header_line(header, &format!("{} ({})", stack.name, stack.status))
}

fn instance_table(container_instances: &[ContainerInstance], instances: &[Instance]) -> String {
    let private_ip = |id: &str| {
        instances
            .iter()
            .find(|i| i.instance_id == id)
            .map_or(String::new(), |i| i.private_ip_address.clone())
    };
    let attribute = |ci: &ContainerInstance, key: &str| {
        ci.attributes
            .get(key)
            .cloned()
            .unwrap_or_else(|| UNKNOWN.to_string())
    };
    let remaining = |ci: &ContainerInstance, key: &str| {
        ci.remaining_resources.get(key).copied().unwrap_or_default()
    };

    let rows: Vec<Vec<String>> = container_instances
        .iter()
        .map(|ci| {
            vec![
                ci.ec2_instance_id.clone(),
                attribute(ci, INSTANCE_TYPE_ATTRIBUTE),
                attribute(ci, AMI_ATTRIBUTE),
                private_ip(&ci.ec2_instance_id),
                attribute(ci, AZ_ATTRIBUTE),
                ci.agent_connected.to_string(),
                ci.status.clone(),
                ci.running_tasks_count.to_string(),
                remaining(ci, "CPU").to_string(),
                remaining(ci, "MEMORY").to_string(),
            ]
        })
        .collect();

    render_table(
        &[
            "EC2 Instance",
            "Type",
            "AMI",
            "IP",
            "AZ",
            "Connected",
            "Status",
            "# Tasks",
            "CPU Avail",
            "Mem Avail",
        ],
        &rows,
    )
}

fn service_table(services: &[Stack]) -> String {
    let rows: Vec<Vec<String>> = services
        .iter()
        .map(|s| {
            vec![
                s.tag(SERVICE_TAG).unwrap_or_default().to_string(),
                s.parameters.get(IMAGE_URL_PARAM).cloned().unwrap_or_default(),
                format!("{} {}", s.status, s.status_reason).trim_end().to_string(),
                s.last_update_time
                    .map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d %H:%M:%S").to_string()),
                s.tag(VERSION_TAG).unwrap_or_default().to_string(),
            ]
        })
        .collect();

    render_table(
        &["Service", "Image", "Status", "Last Update", "Version"],
        &rows,
    )
}

/// Renders rows as left-aligned columns separated by ` | `.
fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let mut out = table_row(headers.iter().copied(), &widths);
    for row in rows {
        out.push_str(&table_row(row.iter().map(String::as_str), &widths));
    }
    out
}

fn table_row<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect();
    format!("{}\n", padded.join(" | ").trim_end())
}

/// Builds the executor that writes a view of an environment to `writer`.
///
/// A missing cluster or load balancer stack fails the view; a missing VPC
/// stack is reported as unmanaged.
#[must_use]
pub fn new_environment_viewer<W>(
    ctx: &Context,
    format: ViewFormat,
    environment_name: impl Into<String>,
    inventory: Inventory,
    writer: Arc<Mutex<W>>,
) -> Arc<dyn Executor>
where
    W: Write + Send + 'static,
{
    let pipeline = PipelineBuilder::new("environment-view")
        .with_events(ctx.events())
        .step(Arc::new(EnvironmentViewer {
            ctx: ctx.clone(),
            format,
            environment_name: environment_name.into(),
            inventory,
            writer,
        }))
        .build();

    Arc::new(pipeline)
}
