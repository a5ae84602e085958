//! Testing utilities for stackflow workflows.
//!
//! This module provides:
//! - In-memory stack and inventory clients that record every call
//! - Stack fixtures
//! - Call-ordering assertions

mod assertions;
mod fakes;
mod fixtures;

pub use assertions::{assert_all_before, assert_called_in_order};
pub use fakes::{FakeInventory, FakeStackManager, StackCall};
pub use fixtures::{cluster_stack, database_stack, service_stack, stack};
