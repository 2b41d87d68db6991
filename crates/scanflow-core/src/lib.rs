//! Business logic and repository trait definitions for Scanflow.
//!
//! This crate defines the "ports" (the chain repository and model
//! provider traits) that the infrastructure layer implements, and the
//! three components that drive a run: the model fallback executor, the
//! chain store accessor, and the workflow engine. It depends only on
//! `scanflow-types` -- never on `scanflow-infra` or any database/IO crate.

pub mod chain;
pub mod llm;
pub mod repository;
pub mod workflow;
