//! Core domain models for the build pipeline.
//!
//! This module contains the task model and the dependency DAG the
//! pipeline runner executes.

pub mod dag;
pub mod task;

pub use dag::TaskDAG;
pub use task::{Task, TaskId, TaskStatus};
