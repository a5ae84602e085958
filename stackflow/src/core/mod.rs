//! Core domain model types for stackflow.
//!
//! This module contains the fundamental types used throughout the crate:
//! - Stack records and stack types
//! - Status classification into lifecycle phases
//! - Deterministic stack naming

mod naming;
mod stack;
mod status;

pub use naming::{create_stack_name, MAX_STACK_NAME_LEN};
pub use stack::{Stack, StackType, ENVIRONMENT_TAG, SERVICE_TAG};
pub use status::{is_complete, StackObservation, StackPhase, IN_PROGRESS_SUFFIX, SUCCESS_SUFFIX};
