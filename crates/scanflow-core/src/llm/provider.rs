//! ModelProvider trait definition.
//!
//! This is the core abstraction that all model providers implement:
//! a uniform "invoke(prompt) -> text" capability. Stateless per call;
//! retry and fallback are the executor's job, never the provider's.
//!
//! Uses native async fn in traits (RPITIT, Rust 2024 edition).
//! Implementations live in scanflow-infra (e.g., `AnthropicProvider`).

use scanflow_types::model::ModelError;

/// Trait for model provider backends (Anthropic, OpenAI-compatible,
/// Google).
pub trait ModelProvider: Send + Sync {
    /// Provider key used in usage logs (e.g. "claude", "gpt4o").
    fn name(&self) -> &str;

    /// Approximate cost per output token in dollars. Reporting only.
    fn cost_per_token(&self) -> f64;

    /// Send a prompt and receive the full text response.
    fn invoke(
        &self,
        prompt: &str,
    ) -> impl std::future::Future<Output = Result<String, ModelError>> + Send;
}
