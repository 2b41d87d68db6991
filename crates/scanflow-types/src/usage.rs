//! Usage accounting types for model invocations.
//!
//! One `UsageLogEntry` is appended per provider attempt (success or
//! failure) for the lifetime of an orchestrator instance. The log is
//! append-only and lives in memory; it is never persisted unless a
//! caller explicitly exports a report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum length of the task description stored in a usage entry.
pub const MAX_TASK_DESCRIPTION_LEN: usize = 100;

/// Number of entries surfaced in a usage report's `recent_usage`.
pub const RECENT_USAGE_LEN: usize = 5;

/// One record per model-invocation attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageLogEntry {
    /// Provider key (e.g. "anthropic").
    pub provider: String,
    pub success: bool,
    /// Wall-clock duration of the attempt.
    pub duration_ms: u64,
    /// Approximate token count (response length / 4). Absent on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_tokens: Option<f64>,
    /// Approximate cost in dollars. Absent on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<f64>,
    /// Provider error message. Absent on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Task description, truncated to [`MAX_TASK_DESCRIPTION_LEN`].
    pub task: String,
    pub timestamp: DateTime<Utc>,
}

/// Aggregate report derived from the full usage log.
///
/// The cost model is intentionally an approximation (chars / 4
/// heuristic): it is used for reporting, not billing, so string
/// formatting with fixed precision is part of the contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageReport {
    pub total_requests: usize,
    pub successful_requests: usize,
    /// Two-decimal percentage string, e.g. "66.67%". "0.00%" when the
    /// log is empty.
    pub success_rate: String,
    /// Six-decimal dollar string, e.g. "0.000123".
    pub total_estimated_cost: String,
    /// The last [`RECENT_USAGE_LEN`] entries, oldest first.
    pub recent_usage: Vec<UsageLogEntry>,
}

impl UsageReport {
    /// Derive a report from an append-only usage log. Pure read.
    pub fn from_log(log: &[UsageLogEntry]) -> Self {
        let total_requests = log.len();
        let successful_requests = log.iter().filter(|e| e.success).count();
        let success_rate = if total_requests == 0 {
            "0.00%".to_string()
        } else {
            format!(
                "{:.2}%",
                successful_requests as f64 / total_requests as f64 * 100.0
            )
        };
        let total_cost: f64 = log.iter().filter_map(|e| e.estimated_cost).sum();
        let recent_usage = log
            .iter()
            .skip(total_requests.saturating_sub(RECENT_USAGE_LEN))
            .cloned()
            .collect();

        Self {
            total_requests,
            successful_requests,
            success_rate,
            total_estimated_cost: format!("{total_cost:.6}"),
            recent_usage,
        }
    }
}
