//! Shared domain types for Scanflow.
//!
//! This crate contains the core domain types used across the Scanflow
//! orchestrator: prompts, chain edges, usage accounting, workflow results,
//! and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod chain;
pub mod config;
pub mod error;
pub mod model;
pub mod usage;
pub mod workflow;
