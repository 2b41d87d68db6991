//! Repository trait definitions (storage ports).

pub mod chain;
