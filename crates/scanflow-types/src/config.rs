//! Orchestrator configuration.
//!
//! Deserialized from `config.toml` by the infrastructure layer. Provider
//! order is a deployment decision: the fallback executor tries providers
//! by ascending `priority`, never adaptively.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default step ceiling: the sole circuit breaker against cyclic chains.
pub const DEFAULT_MAX_STEPS: u32 = 10;

/// Default title of the context-enriching prompt. A step whose prompt
/// title matches is rendered with project metadata and recent history.
pub const DEFAULT_CONTEXT_LOADER_TITLE: &str = "Scanner: Context Loader";

/// Top-level orchestrator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Override for the sqlite database URL.
    pub database_url: Option<String>,
    /// Project whose metadata is embedded into the context-enriching step.
    pub project_id: Option<Uuid>,
    /// Title designating the context-enriching prompt.
    pub context_loader_title: String,
    /// Maximum steps per run.
    pub max_steps: u32,
    /// Providers in fallback order (sorted by `priority` at load time).
    pub providers: Vec<ProviderConfig>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            project_id: None,
            context_loader_title: DEFAULT_CONTEXT_LOADER_TITLE.to_string(),
            max_steps: DEFAULT_MAX_STEPS,
            providers: Vec::new(),
        }
    }
}

/// The kind of provider backend to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderType {
    Anthropic,
    OpenaiCompat,
    Google,
}

/// Configuration for one model provider in the fallback chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider key used in usage logs (e.g. "claude").
    pub name: String,
    #[serde(rename = "type")]
    pub provider_type: ProviderType,
    /// Model identifier (e.g. "claude-sonnet-4-20250514").
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Override for the provider base URL.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Sampling temperature. The orchestrator defaults to 0 for
    /// deterministic JSON output.
    #[serde(default)]
    pub temperature: Option<f64>,
    /// Maximum output tokens per completion.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Approximate cost per output token in dollars, used for reporting.
    pub cost_per_token: f64,
    /// Fallback order, ascending. Lower tries first.
    #[serde(default)]
    pub priority: u32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_enabled() -> bool {
    true
}
