//! Sequential, fail-fast pipeline runner.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use super::{Conditional, Executor};
use crate::errors::Result;
use crate::events::{payload, EventSink, NoOpEventSink};

/// One entry of a pipeline: an executor, optionally guarded.
#[derive(Debug, Clone)]
pub struct Step {
    executor: Arc<dyn Executor>,
    guard: Option<Arc<dyn Conditional>>,
}

impl Step {
    /// Creates an unguarded step.
    #[must_use]
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        Self {
            executor,
            guard: None,
        }
    }

    /// Creates a step that only runs when `guard` evaluates to true.
    #[must_use]
    pub fn guarded(guard: Arc<dyn Conditional>, executor: Arc<dyn Executor>) -> Self {
        Self {
            executor,
            guard: Some(guard),
        }
    }

    /// Returns the executor's name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.executor.name()
    }

    /// Returns true if the step has a guard.
    #[must_use]
    pub fn is_guarded(&self) -> bool {
        self.guard.is_some()
    }
}

/// Outcome of a successful pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    /// Identifier of this invocation, also carried by every event.
    pub run_id: Uuid,
    /// Steps that ran, in order.
    pub executed: Vec<String>,
    /// Steps whose guard evaluated to false.
    pub skipped: Vec<String>,
    /// Wall time in milliseconds.
    pub duration_ms: f64,
}

/// Builder for [`Pipeline`].
#[derive(Clone)]
pub struct PipelineBuilder {
    name: String,
    steps: Vec<Step>,
    events: Arc<dyn EventSink>,
}

impl PipelineBuilder {
    /// Creates a new pipeline builder that discards events.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
            events: Arc::new(NoOpEventSink),
        }
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Appends an unguarded step.
    #[must_use]
    pub fn step(mut self, executor: Arc<dyn Executor>) -> Self {
        self.steps.push(Step::new(executor));
        self
    }

    /// Appends a guarded step.
    #[must_use]
    pub fn guarded_step(mut self, guard: Arc<dyn Conditional>, executor: Arc<dyn Executor>) -> Self {
        self.steps.push(Step::guarded(guard, executor));
        self
    }

    /// Appends a prepared step.
    #[must_use]
    pub fn add_step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of steps.
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Builds the pipeline.
    #[must_use]
    pub fn build(self) -> Pipeline {
        Pipeline {
            name: self.name,
            steps: self.steps,
            events: self.events,
        }
    }
}

impl std::fmt::Debug for PipelineBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineBuilder")
            .field("name", &self.name)
            .field("steps", &self.steps)
            .finish_non_exhaustive()
    }
}

/// An ordered list of steps run one after another.
///
/// The first failing step stops the pipeline and its error is returned
/// unchanged. Completed steps are not undone.
pub struct Pipeline {
    name: String,
    steps: Vec<Step>,
    events: Arc<dyn EventSink>,
}

impl Pipeline {
    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the step names in execution order.
    #[must_use]
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(Step::name).collect()
    }

    /// Runs every step in order.
    ///
    /// # Errors
    ///
    /// Returns the error of the first step that fails.
    pub async fn run(&self) -> Result<PipelineReport> {
        let run_id = Uuid::new_v4();
        let start = Instant::now();
        let mut executed = Vec::new();
        let mut skipped = Vec::new();

        self.events
            .emit(
                "pipeline.started",
                Some(payload(
                    format!("Running pipeline '{}'", self.name),
                    json!({
                        "pipeline": self.name,
                        "run_id": run_id.to_string(),
                        "steps": self.steps.len(),
                    }),
                )),
            )
            .await;

        for (index, step) in self.steps.iter().enumerate() {
            let step_name = step.name().to_string();

            if let Some(guard) = &step.guard {
                if !guard.evaluate() {
                    self.events
                        .emit(
                            "pipeline.step.skipped",
                            Some(payload(
                                format!("Skipping step '{step_name}'"),
                                json!({
                                    "pipeline": self.name,
                                    "run_id": run_id.to_string(),
                                    "step": step_name,
                                    "index": index,
                                    "guard": guard.name(),
                                }),
                            )),
                        )
                        .await;
                    skipped.push(step_name);
                    continue;
                }
            }

            self.events
                .emit(
                    "pipeline.step.started",
                    Some(payload(
                        format!("Running step '{step_name}'"),
                        json!({
                            "pipeline": self.name,
                            "run_id": run_id.to_string(),
                            "step": step_name,
                            "index": index,
                        }),
                    )),
                )
                .await;

            if let Err(err) = step.executor.execute().await {
                self.events
                    .emit(
                        "pipeline.step.failed",
                        Some(payload(
                            format!("Step '{step_name}' failed: {err}"),
                            json!({
                                "pipeline": self.name,
                                "run_id": run_id.to_string(),
                                "step": step_name,
                                "index": index,
                                "error": err.to_string(),
                            }),
                        )),
                    )
                    .await;
                self.events
                    .emit(
                        "pipeline.failed",
                        Some(payload(
                            format!("Pipeline '{}' failed", self.name),
                            json!({
                                "pipeline": self.name,
                                "run_id": run_id.to_string(),
                                "duration_ms": start.elapsed().as_secs_f64() * 1000.0,
                            }),
                        )),
                    )
                    .await;
                return Err(err);
            }

            executed.push(step_name);
        }

        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
        self.events
            .emit(
                "pipeline.completed",
                Some(payload(
                    format!("Pipeline '{}' completed", self.name),
                    json!({
                        "pipeline": self.name,
                        "run_id": run_id.to_string(),
                        "executed": executed.len(),
                        "skipped": skipped.len(),
                        "duration_ms": duration_ms,
                    }),
                )),
            )
            .await;

        Ok(PipelineReport {
            run_id,
            executed,
            skipped,
            duration_ms,
        })
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("steps", &self.step_names())
            .finish()
    }
}

#[async_trait]
impl Executor for Pipeline {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self) -> Result<()> {
        self.run().await.map(|_| ())
    }
}
