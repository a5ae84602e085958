//! Execution context shared by every step of a workflow.
//!
//! This module provides:
//! - [`Context`]: project configuration, stack clients and the event sink
//! - Per-feature workflow state records populated by input steps

mod state;

pub use state::{
    shared, DatabaseWorkflow, EnvironmentWorkflow, PipelineWorkflow, ServiceWorkflow, Shared,
};

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::client::{StackDeleter, StackGetter, StackLister, StackManager, StackWaiter};
use crate::config::ProjectConfig;
use crate::core::{create_stack_name, StackType};
use crate::errors::NamingError;
use crate::events::{EventSink, LoggingEventSink};

/// The stack client capabilities, split so each step receives only what it uses.
#[derive(Clone)]
pub struct StackClients {
    /// Lists stacks by type.
    pub lister: Arc<dyn StackLister>,
    /// Fetches single stacks.
    pub getter: Arc<dyn StackGetter>,
    /// Submits deletions.
    pub deleter: Arc<dyn StackDeleter>,
    /// Awaits terminal statuses.
    pub waiter: Arc<dyn StackWaiter>,
}

impl StackClients {
    /// Splits one manager into its capabilities.
    pub fn from_manager<M>(manager: Arc<M>) -> Self
    where
        M: StackManager + 'static,
    {
        Self {
            lister: manager.clone(),
            getter: manager.clone(),
            deleter: manager.clone(),
            waiter: manager,
        }
    }
}

impl fmt::Debug for StackClients {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StackClients").finish_non_exhaustive()
    }
}

/// Everything a workflow needs from its caller.
#[derive(Clone)]
pub struct Context {
    config: ProjectConfig,
    stacks: StackClients,
    events: Arc<dyn EventSink>,
}

impl Context {
    /// Creates a context that logs through `tracing`.
    pub fn new<M>(config: ProjectConfig, manager: Arc<M>) -> Self
    where
        M: StackManager + 'static,
    {
        Self::with_clients(config, StackClients::from_manager(manager))
    }

    /// Creates a context from individual stack capabilities.
    #[must_use]
    pub fn with_clients(config: ProjectConfig, stacks: StackClients) -> Self {
        Self {
            config,
            stacks,
            events: Arc::new(LoggingEventSink::default()),
        }
    }

    /// Replaces the event sink.
    #[must_use]
    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Returns the project configuration.
    #[must_use]
    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    /// Returns the stack clients.
    #[must_use]
    pub fn stacks(&self) -> &StackClients {
        &self.stacks
    }

    /// Returns the event sink.
    #[must_use]
    pub fn events(&self) -> Arc<dyn EventSink> {
        self.events.clone()
    }

    /// Emits an event through the context's sink.
    pub async fn emit(&self, event_type: &str, data: Value) {
        self.events.emit(event_type, Some(data)).await;
    }

    /// Builds a stack name in this context's namespace.
    ///
    /// # Errors
    ///
    /// Returns a [`NamingError`] if any component is invalid.
    pub fn stack_name(&self, stack_type: StackType, parts: &[&str]) -> Result<String, NamingError> {
        create_stack_name(&self.config.namespace, stack_type, parts)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
