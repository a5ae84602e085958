//! Pipeline composition and execution.
//!
//! This module provides:
//! - The [`Executor`] and [`Conditional`] primitives and closure adapters
//! - A branching [`ConditionalExecutor`]
//! - A sequential fail-fast [`Pipeline`] built with [`PipelineBuilder`]

mod executor;
mod runner;

pub use executor::{
    Conditional, ConditionalExecutor, Executor, FnConditional, FnExecutor, NoOpExecutor,
};
pub use runner::{Pipeline, PipelineBuilder, PipelineReport, Step};
