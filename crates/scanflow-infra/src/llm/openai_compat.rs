//! OpenAiCompatProvider -- [`ModelProvider`] for OpenAI-compatible APIs.
//!
//! Speaks the chat completions protocol (`/v1/chat/completions`) with
//! Bearer authentication. Works against OpenAI itself and any
//! compatible gateway when `base_url` is overridden.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use scanflow_core::llm::provider::ModelProvider;
use scanflow_types::config::ProviderConfig;
use scanflow_types::model::ModelError;

/// Provider for OpenAI-compatible chat completion endpoints.
pub struct OpenAiCompatProvider {
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
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl OpenAiCompatProvider {
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
                .unwrap_or_else(|| "https://api.openai.com".to_string()),
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

impl ModelProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn cost_per_token(&self) -> f64 {
        self.cost_per_token
    }

    async fn invoke(&self, prompt: &str) -> Result<String, ModelError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(self.url("/v1/chat/completions"))
            .bearer_auth(self.api_key.expose_secret())
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

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ModelError::Deserialization(format!("failed to parse response: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ModelError::Deserialization("response contained no choices".to_string()))
    }
}
