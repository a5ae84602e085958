//! Executor and Conditional primitives.
//!
//! An [`Executor`] performs one unit of work and reports success or an error.
//! A [`Conditional`] is a cheap, side-effect-free predicate used to decide
//! whether a step runs.

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::fmt::{self, Debug};
use std::future::Future;
use std::sync::Arc;

use crate::errors::Result;

/// A single unit of work.
///
/// Executors run at most once per pipeline invocation and offer no rollback:
/// an executor that fails halfway must leave things in a state where running
/// it again is safe.
#[async_trait]
pub trait Executor: Send + Sync + Debug {
    /// Returns the name used in events and errors.
    fn name(&self) -> &str;

    /// Performs the work.
    async fn execute(&self) -> Result<()>;
}

/// A predicate consulted before running a guarded step.
pub trait Conditional: Send + Sync + Debug {
    /// Returns the name used in events.
    fn name(&self) -> &str;

    /// Evaluates the predicate. Must not have side effects.
    fn evaluate(&self) -> bool;
}

type ExecutorFn = Box<dyn Fn() -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// An executor backed by an async closure.
pub struct FnExecutor {
    name: String,
    func: ExecutorFn,
}

impl FnExecutor {
    /// Creates an executor from a closure returning a future.
    pub fn new<F, Fut>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Self {
            name: name.into(),
            func: Box::new(move || func().boxed()),
        }
    }
}

impl Debug for FnExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnExecutor").field("name", &self.name).finish()
    }
}

#[async_trait]
impl Executor for FnExecutor {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self) -> Result<()> {
        (self.func)().await
    }
}

/// A conditional backed by a closure.
pub struct FnConditional<F>
where
    F: Fn() -> bool + Send + Sync,
{
    name: String,
    func: F,
}

impl<F> FnConditional<F>
where
    F: Fn() -> bool + Send + Sync,
{
    /// Creates a conditional from a closure.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Debug for FnConditional<F>
where
    F: Fn() -> bool + Send + Sync,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnConditional")
            .field("name", &self.name)
            .finish()
    }
}

impl<F> Conditional for FnConditional<F>
where
    F: Fn() -> bool + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self) -> bool {
        (self.func)()
    }
}

/// An executor that does nothing.
#[derive(Debug, Clone)]
pub struct NoOpExecutor {
    name: String,
}

impl NoOpExecutor {
    /// Creates a new no-op executor.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Executor for NoOpExecutor {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self) -> Result<()> {
        Ok(())
    }
}

/// Runs one of two executors depending on a conditional.
///
/// The conditional is evaluated when the executor runs, not when it is built,
/// so it sees state written by earlier steps.
#[derive(Debug)]
pub struct ConditionalExecutor {
    name: String,
    condition: Arc<dyn Conditional>,
    if_true: Arc<dyn Executor>,
    if_false: Option<Arc<dyn Executor>>,
}

impl ConditionalExecutor {
    /// Creates a branch with no else arm.
    pub fn new(condition: Arc<dyn Conditional>, if_true: Arc<dyn Executor>) -> Self {
        Self {
            name: format!("{}?{}", condition.name(), if_true.name()),
            condition,
            if_true,
            if_false: None,
        }
    }

    /// Sets the executor run when the conditional is false.
    #[must_use]
    pub fn otherwise(mut self, if_false: Arc<dyn Executor>) -> Self {
        self.if_false = Some(if_false);
        self
    }
}

#[async_trait]
impl Executor for ConditionalExecutor {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self) -> Result<()> {
        if self.condition.evaluate() {
            self.if_true.execute().await
        } else if let Some(if_false) = &self.if_false {
            if_false.execute().await
        } else {
            Ok(())
        }
    }
}
