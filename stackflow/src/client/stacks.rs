//! Stack client capabilities.

use async_trait::async_trait;

use crate::core::{Stack, StackType};
use crate::errors::StackClientError;

/// Lists stacks of one type.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StackLister: Send + Sync {
    /// Returns every stack of the given type.
    async fn list_stacks(&self, stack_type: StackType) -> Result<Vec<Stack>, StackClientError>;
}

/// Fetches a single stack.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StackGetter: Send + Sync {
    /// Returns the named stack, or `None` if it does not exist.
    async fn get_stack(&self, name: &str) -> Result<Option<Stack>, StackClientError>;
}

/// Submits asynchronous stack deletions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StackDeleter: Send + Sync {
    /// Requests deletion of the named stack. Returns once the request is
    /// accepted, not once the stack is gone.
    async fn delete_stack(&self, name: &str) -> Result<(), StackClientError>;
}

/// Waits for stacks to settle.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StackWaiter: Send + Sync {
    /// Blocks until the named stack reaches a terminal status.
    ///
    /// Returns `None` if no stack exists under the name. Polling cadence and
    /// timeouts belong to the implementation.
    async fn await_final_status(&self, name: &str) -> Option<Stack>;
}

/// A client offering every stack capability.
pub trait StackManager: StackLister + StackGetter + StackDeleter + StackWaiter {}

impl<T> StackManager for T where T: StackLister + StackGetter + StackDeleter + StackWaiter {}
