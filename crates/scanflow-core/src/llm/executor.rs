//! Model fallback executor.
//!
//! Presents one prompt to an ordered list of providers and returns the
//! first success. Providers are tried strictly in the configured order,
//! never concurrently and never twice for the same step: racing would
//! multiply cost and duplicate side effects, and per-provider retries
//! belong to nobody (a failed provider simply yields to the next one).
//!
//! Every attempt, successful or not, appends one entry to an in-memory
//! usage log owned by the executor for its lifetime.

use std::time::Instant;

use chrono::Utc;
use scanflow_types::error::WorkflowError;
use scanflow_types::model::ModelOutcome;
use scanflow_types::usage::{MAX_TASK_DESCRIPTION_LEN, UsageLogEntry, UsageReport};

use super::box_provider::BoxModelProvider;

/// Chars-per-token heuristic for cost estimation. An approximation by
/// design: the figure feeds reports, not billing.
const CHARS_PER_TOKEN: f64 = 4.0;

/// Tries providers in fixed priority order, returning the first success.
pub struct FallbackExecutor {
    providers: Vec<BoxModelProvider>,
    usage_log: Vec<UsageLogEntry>,
}

impl FallbackExecutor {
    /// Create an executor over providers already sorted in fallback order.
    pub fn new(providers: Vec<BoxModelProvider>) -> Self {
        Self {
            providers,
            usage_log: Vec::new(),
        }
    }

    /// Present `prompt` to each provider in order; return the first
    /// success.
    ///
    /// On a provider failure the error is recorded in the usage log and
    /// the next provider is tried. Once a provider succeeds, no further
    /// providers are invoked. If every provider fails, the step fails
    /// with [`WorkflowError::AllProvidersFailed`].
    pub async fn execute(
        &mut self,
        prompt: &str,
        task: &str,
    ) -> Result<ModelOutcome, WorkflowError> {
        for idx in 0..self.providers.len() {
            let provider_name = self.providers[idx].name().to_string();
            let start = Instant::now();

            tracing::debug!(provider = %provider_name, task, "trying provider");

            match self.providers[idx].invoke(prompt).await {
                Ok(content) => {
                    let duration_ms = start.elapsed().as_millis() as u64;
                    let estimated_tokens = content.len() as f64 / CHARS_PER_TOKEN;
                    let estimated_cost =
                        estimated_tokens * self.providers[idx].cost_per_token();

                    self.usage_log.push(UsageLogEntry {
                        provider: provider_name.clone(),
                        success: true,
                        duration_ms,
                        estimated_tokens: Some(estimated_tokens),
                        estimated_cost: Some(estimated_cost),
                        error: None,
                        task: truncate_task(task),
                        timestamp: Utc::now(),
                    });

                    tracing::info!(
                        provider = %provider_name,
                        duration_ms,
                        estimated_cost,
                        "provider succeeded"
                    );

                    return Ok(ModelOutcome {
                        content,
                        provider: provider_name,
                        duration_ms,
                        estimated_cost,
                    });
                }
                Err(err) => {
                    let duration_ms = start.elapsed().as_millis() as u64;

                    tracing::warn!(
                        provider = %provider_name,
                        error = %err,
                        "provider failed, trying next in chain"
                    );

                    self.usage_log.push(UsageLogEntry {
                        provider: provider_name,
                        success: false,
                        duration_ms,
                        estimated_tokens: None,
                        estimated_cost: None,
                        error: Some(err.to_string()),
                        task: truncate_task(task),
                        timestamp: Utc::now(),
                    });
                }
            }
        }

        Err(WorkflowError::AllProvidersFailed {
            task: truncate_task(task),
        })
    }

    /// Derive a usage report from the full log. Pure read, no side
    /// effects.
    pub fn usage_report(&self) -> UsageReport {
        UsageReport::from_log(&self.usage_log)
    }

    /// The full append-only usage log, oldest first.
    pub fn usage_log(&self) -> &[UsageLogEntry] {
        &self.usage_log
    }
}

/// Truncate a task description to the stored maximum, respecting char
/// boundaries.
fn truncate_task(task: &str) -> String {
    if task.len() <= MAX_TASK_DESCRIPTION_LEN {
        return task.to_string();
    }
    let mut end = MAX_TASK_DESCRIPTION_LEN;
    while !task.is_char_boundary(end) {
        end -= 1;
    }
    task[..end].to_string()
}
