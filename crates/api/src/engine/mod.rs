//! Task workflow engine.
//!
//! [`TaskWorkflow`] sequences every task and document operation: existence
//! and authorization checks, state-machine guards, delta validation, merge,
//! and the atomic store writes. Handlers are thin wrappers around it.

pub mod workflow;

pub use workflow::{NewTaskInput, TaskWorkflow, WorkflowConfig};
