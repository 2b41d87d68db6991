//! Infrastructure adapters for Scanflow.
//!
//! Implements the ports defined in `scanflow-core`: the SQLite chain
//! repository (sqlx, split reader/writer WAL pools) and the HTTP model
//! providers (Anthropic, OpenAI-compatible, Google). Also hosts the
//! TOML configuration loader.

pub mod config;
pub mod llm;
pub mod sqlite;
