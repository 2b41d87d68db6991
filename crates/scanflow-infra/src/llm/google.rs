//! GoogleProvider -- [`ModelProvider`] for the Gemini API.
//!
//! Sends requests to `generateContent`. Gemini authenticates with a
//! `key` query parameter rather than a header, so the key is exposed
//! only while building the request URL.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use scanflow_core::llm::provider::ModelProvider;
use scanflow_types::config::ProviderConfig;
use scanflow_types::model::ModelError;

/// Provider for Google Gemini models.
pub struct GoogleProvider {
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
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GoogleProvider {
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
                .unwrap_or_else(|| "https://generativelanguage.googleapis.com".to_string()),
            name: config.name.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            cost_per_token: config.cost_per_token,
        }
    }

    fn url(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }
}

impl ModelProvider for GoogleProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn cost_per_token(&self) -> f64 {
        self.cost_per_token
    }

    async fn invoke(&self, prompt: &str) -> Result<String, ModelError> {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: self.max_tokens,
                temperature: self.temperature,
            },
        };

        let response = self
            .client
            .post(self.url())
            .query(&[("key", self.api_key.expose_secret())])
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
                401 | 403 => ModelError::AuthenticationFailed,
                429 => ModelError::RateLimited {
                    retry_after_ms: None,
                },
                _ => ModelError::Provider {
                    message: format!("HTTP {status}: {error_body}"),
                },
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ModelError::Deserialization(format!("failed to parse response: {e}")))?;

        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .and_then(|p| p.text)
            .ok_or_else(|| {
                ModelError::Deserialization("response contained no candidates".to_string())
            })
    }
}
