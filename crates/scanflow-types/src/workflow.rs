//! Workflow run result and audit log types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Terminal artifact of one workflow run.
///
/// Serialized camelCase (`finalOutput`, `totalSteps`) -- this shape is
/// the external contract printed by the CLI and logged externally.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowResult {
    pub success: bool,
    /// Final step's parsed JSON output. Absent on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_output: Option<Value>,
    /// Error message. Absent on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Number of steps executed before termination.
    pub total_steps: u32,
}

impl WorkflowResult {
    /// Success terminal: no outgoing edge matched the final output.
    pub fn success(final_output: Value, total_steps: u32) -> Self {
        Self {
            success: true,
            final_output: Some(final_output),
            error: None,
            total_steps,
        }
    }

    /// Failure terminal: a fatal condition aborted the run.
    pub fn failure(error: impl Into<String>, total_steps: u32) -> Self {
        Self {
            success: false,
            final_output: None,
            error: Some(error.into()),
            total_steps,
        }
    }
}

/// One row in the external audit log.
///
/// Free-text step/status/content plus structured metadata; written at
/// run terminal points and surfaced back into the context-enriching
/// step as "recent history".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    /// What was being executed (prompt title or "workflow_error").
    pub step: String,
    /// "success" or "error".
    pub status: String,
    /// Output or error text, truncated by the writer.
    pub content: String,
    /// Structured run metadata (provider, duration, cost, input).
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    /// Maximum content length persisted per entry.
    pub const MAX_CONTENT_LEN: usize = 500;

    /// Build a new entry with content truncated to [`Self::MAX_CONTENT_LEN`].
    pub fn new(step: impl Into<String>, status: impl Into<String>, content: &str, metadata: Value) -> Self {
        let content = if content.len() > Self::MAX_CONTENT_LEN {
            let mut end = Self::MAX_CONTENT_LEN;
            while !content.is_char_boundary(end) {
                end -= 1;
            }
            content[..end].to_string()
        } else {
            content.to_string()
        };

        Self {
            id: Uuid::now_v7(),
            step: step.into(),
            status: status.into(),
            content,
            metadata,
            created_at: Utc::now(),
        }
    }
}
