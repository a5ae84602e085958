//! Stack status classification.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Stack;

/// Suffix shared by every successful terminal status.
pub const SUCCESS_SUFFIX: &str = "_COMPLETE";

/// Suffix shared by every transitional status.
pub const IN_PROGRESS_SUFFIX: &str = "_IN_PROGRESS";

/// Returns true if the status denotes a successful terminal state.
#[must_use]
pub fn is_complete(status: &str) -> bool {
    status.ends_with(SUCCESS_SUFFIX)
}

/// The lifecycle phase of an existing stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackPhase {
    /// An operation is still running.
    InProgress,
    /// Settled in a `*_COMPLETE` status.
    Succeeded,
    /// Settled in any other status.
    Failed,
}

impl StackPhase {
    /// Classifies a provider status string.
    #[must_use]
    pub fn classify(status: &str) -> Self {
        if is_complete(status) {
            Self::Succeeded
        } else if status.ends_with(IN_PROGRESS_SUFFIX) {
            Self::InProgress
        } else {
            Self::Failed
        }
    }

    /// Returns true if the phase will not change without external action.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Returns true if the phase indicates success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

impl fmt::Display for StackPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InProgress => write!(f, "in_progress"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// What a status poll observed for one stack name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "phase")]
pub enum StackObservation {
    /// No stack exists under the name.
    Absent,
    /// A stack exists in the given phase.
    Present(StackPhase),
}

impl StackObservation {
    /// Builds an observation from an optional stack.
    #[must_use]
    pub fn of(stack: Option<&Stack>) -> Self {
        stack.map_or(Self::Absent, |s| Self::Present(s.phase()))
    }

    /// Returns true if this is an acceptable teardown post-condition.
    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        matches!(self, Self::Absent | Self::Present(StackPhase::Succeeded))
    }
}
