//! AnthropicProvider -- [`ModelProvider`] implementation for Anthropic Claude.
//!
//! Sends requests to the Anthropic Messages API (`/v1/messages`) with
//! proper authentication headers.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is never logged
//! or included in `Debug` output.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use scanflow_core::llm::provider::ModelProvider;
use scanflow_types::config::ProviderConfig;
use scanflow_types::model::ModelError;

/// Anthropic Claude model provider.
///
/// The API key is stored as a [`SecretString`] and is only exposed when
/// constructing HTTP request headers.
pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    name: String,
    model: String,
    temperature: Option<f64>,
    max_tokens: u32,
    cost_per_token: f64,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<MessageBody<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

#[derive(Serialize)]
struct MessageBody<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

impl AnthropicProvider {
    /// The Anthropic API version header value.
    const API_VERSION: &'static str = "2023-06-01";

    /// Create a provider from its fallback-chain configuration and a
    /// resolved API key.
    pub fn new(config: &ProviderConfig, api_key: SecretString) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .expect("failed to create reqwest client");

        Self {
            client,
            api_key,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| "https://api.anthropic.com".to_string()),
            name: config.name.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            cost_per_token: config.cost_per_token,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

// No Debug derive: keeps the API key out of accidental debug output.

impl ModelProvider for AnthropicProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn cost_per_token(&self) -> f64 {
        self.cost_per_token
    }

    async fn invoke(&self, prompt: &str) -> Result<String, ModelError> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: vec![MessageBody {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(self.url("/v1/messages"))
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", Self::API_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ModelError::Provider {
                message: format!("HTTP request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 => ModelError::AuthenticationFailed,
                429 => ModelError::RateLimited {
                    retry_after_ms: None,
                },
                _ => ModelError::Provider {
                    message: format!("HTTP {status}: {error_body}"),
                },
            });
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| ModelError::Deserialization(format!("failed to parse response: {e}")))?;

        let content = parsed
            .content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                ContentBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("");

        Ok(content)
    }
}
