//! HTTP model provider implementations and the provider factory.

pub mod anthropic;
pub mod google;
pub mod openai_compat;

pub use anthropic::AnthropicProvider;
pub use google::GoogleProvider;
pub use openai_compat::OpenAiCompatProvider;

use secrecy::SecretString;

use scanflow_core::llm::BoxModelProvider;
use scanflow_types::config::{ProviderConfig, ProviderType};

/// Build the fallback provider list from configuration.
///
/// Disabled entries and entries whose API key environment variable is
/// unset are skipped with a warning; a misconfigured provider should
/// degrade the fallback chain, not abort startup. The result is sorted
/// by ascending `priority`.
pub fn build_providers(configs: &[ProviderConfig]) -> Vec<BoxModelProvider> {
    let mut configs: Vec<&ProviderConfig> = configs.iter().filter(|c| c.enabled).collect();
    configs.sort_by_key(|c| c.priority);

    let mut providers = Vec::with_capacity(configs.len());
    for config in configs {
        let api_key = match std::env::var(&config.api_key_env) {
            Ok(key) if !key.is_empty() => SecretString::from(key),
            _ => {
                tracing::warn!(
                    provider = %config.name,
                    env = %config.api_key_env,
                    "skipping provider, API key environment variable not set"
                );
                continue;
            }
        };

        providers.push(match config.provider_type {
            ProviderType::Anthropic => {
                BoxModelProvider::new(AnthropicProvider::new(config, api_key))
            }
            ProviderType::OpenaiCompat => {
                BoxModelProvider::new(OpenAiCompatProvider::new(config, api_key))
            }
            ProviderType::Google => BoxModelProvider::new(GoogleProvider::new(config, api_key)),
        });
    }

    providers
}
