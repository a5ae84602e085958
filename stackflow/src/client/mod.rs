//! Interfaces to the external stack-management and inventory services.
//!
//! The workflows depend only on these capabilities. Each trait is narrow so a
//! step can be handed exactly the operations it performs.

mod inventory;
mod stacks;

pub use inventory::{
    ClusterInstanceLister, ContainerInstance, Instance, InstanceLister, Inventory, Task,
    TaskLister,
};
pub use stacks::{StackDeleter, StackGetter, StackLister, StackManager, StackWaiter};

#[cfg(test)]
pub use inventory::{MockClusterInstanceLister, MockInstanceLister, MockTaskLister};
#[cfg(test)]
pub use stacks::{MockStackDeleter, MockStackGetter, MockStackLister, MockStackWaiter};
