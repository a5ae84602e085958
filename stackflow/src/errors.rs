//! Error types for stackflow workflows.
//!
//! Errors fall into three families that drive how the pipeline runner and the
//! teardown sequencer react:
//!
//! - input errors: no usable name could be resolved, raised before any remote call
//! - submission errors: a list/get/delete request was rejected by the stack client
//! - terminal failures: a stack settled in a status that is not `*_COMPLETE`

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Convenience result alias used by every executor.
pub type Result<T, E = StackflowError> = std::result::Result<T, E>;

/// The main error type for stackflow operations.
#[derive(Debug, Error)]
pub enum StackflowError {
    /// Input resolution failed.
    #[error("{0}")]
    Input(#[from] InputError),

    /// A stack name could not be constructed.
    #[error("{0}")]
    Naming(#[from] NamingError),

    /// The stack client or an inventory client rejected a request.
    #[error("{0}")]
    Client(#[from] StackClientError),

    /// A stack settled in a failed terminal status.
    #[error("Ended in failed status {status} {reason}")]
    TerminalFailure {
        /// The stack name.
        stack: String,
        /// The literal terminal status.
        status: String,
        /// The provider's status reason, possibly empty.
        reason: String,
    },

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StackflowError {
    /// Creates a terminal failure error.
    #[must_use]
    pub fn terminal_failure(
        stack: impl Into<String>,
        status: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::TerminalFailure {
            stack: stack.into(),
            status: status.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if this is an input-resolution error.
    #[must_use]
    pub fn is_input(&self) -> bool {
        matches!(self, Self::Input(_) | Self::Naming(_))
    }

    /// Returns true if a request to a remote client failed.
    #[must_use]
    pub fn is_submission(&self) -> bool {
        matches!(self, Self::Client(_))
    }

    /// Returns true if a stack reached a failed terminal status.
    #[must_use]
    pub fn is_terminal_failure(&self) -> bool {
        matches!(self, Self::TerminalFailure { .. })
    }
}

impl From<serde_json::Error> for StackflowError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Errors raised while resolving workflow inputs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// Neither an explicit name nor any configured fallback was set.
    #[error("Service name must be provided")]
    MissingServiceName,

    /// An environment name was required but empty.
    #[error("Environment name must be provided")]
    MissingEnvironmentName,
}

/// Errors raised by the naming resolver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NamingError {
    /// A name component was empty.
    #[error("Stack name component '{component}' must not be empty")]
    EmptyComponent {
        /// Which component was empty.
        component: String,
    },

    /// A name component contained characters the provider rejects.
    #[error("Stack name component '{value}' contains invalid characters")]
    InvalidCharacters {
        /// The offending value.
        value: String,
    },

    /// The assembled name exceeds the provider's limit.
    #[error("Stack name '{name}' exceeds {max} characters")]
    TooLong {
        /// The assembled name.
        name: String,
        /// The limit.
        max: usize,
    },
}

/// The remote operation a client error relates to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackOperation {
    /// Listing stacks by type.
    List,
    /// Fetching a single stack.
    Get,
    /// Submitting a delete.
    Delete,
}

impl fmt::Display for StackOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List => write!(f, "list"),
            Self::Get => write!(f, "get"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Errors surfaced by the external stack client and inventory collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StackClientError {
    /// The stack-management API rejected a request.
    #[error("Stack {operation} failed for '{stack}': {message}")]
    Api {
        /// The operation attempted.
        operation: StackOperation,
        /// The stack name or type the request addressed.
        stack: String,
        /// Provider message.
        message: String,
    },

    /// An inventory lookup failed.
    #[error("Inventory error: {0}")]
    Inventory(String),
}

impl StackClientError {
    /// Creates an API error.
    #[must_use]
    pub fn api(
        operation: StackOperation,
        stack: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Api {
            operation,
            stack: stack.into(),
            message: message.into(),
        }
    }
}
