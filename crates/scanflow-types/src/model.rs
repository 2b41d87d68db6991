//! Model provider types.
//!
//! The orchestrator treats every language-model provider as a uniform
//! "invoke(prompt) -> text" capability. Provider selection (model name,
//! temperature) is deployment configuration, not part of this contract.

use thiserror::Error;

/// Errors from a single model provider invocation.
///
/// The fallback executor treats all of these identically: it records a
/// failed usage entry and moves on to the next provider in priority
/// order. No retry happens at the provider level.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("provider error: {message}")]
    Provider { message: String },

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("rate limited (retry after {retry_after_ms:?}ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("deserialization error: {0}")]
    Deserialization(String),
}

/// Outcome of one successful invocation through the fallback executor.
#[derive(Debug, Clone)]
pub struct ModelOutcome {
    /// Raw text content returned by the provider.
    pub content: String,
    /// Name of the provider that produced the response.
    pub provider: String,
    /// Wall-clock duration of the winning attempt.
    pub duration_ms: u64,
    /// Approximate cost of the winning attempt in dollars.
    pub estimated_cost: f64,
}
