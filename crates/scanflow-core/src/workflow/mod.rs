//! Workflow engine: the step loop driving render -> invoke -> parse ->
//! resolve-next.

pub mod context;
pub mod engine;
pub mod render;

pub use engine::WorkflowEngine;
