//! Chain graph domain types.
//!
//! A workflow is a directed graph of prompts connected by conditional
//! edges. Exactly one edge has no source prompt and carries the reserved
//! `start_prompt` condition key: that is where a run begins. All other
//! edges are guarded by equality conditions over the previous step's
//! parsed JSON output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Reserved condition key marking the unique entry edge of a workflow.
///
/// It is ignored during condition matching on interior edges.
pub const START_PROMPT_KEY: &str = "start_prompt";

/// A stored prompt template.
///
/// The body may contain an `{{input}}` placeholder that is replaced with
/// the accumulated run context before the strict-JSON wrapper is applied.
/// Prompts are immutable once fetched for a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prompt {
    pub id: Uuid,
    /// Unique display name (e.g. "Scanner: Context Loader").
    pub title: String,
    /// Template body.
    pub body: String,
    /// Inactive prompts are kept in the store but never executed.
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// A directed transition between two prompts.
///
/// `from_prompt_id = None` marks an entry edge. `condition` maps output
/// keys to the exact values the previous step must have produced for this
/// edge to be taken. `position` is the explicit listing order used for
/// deterministic first-match resolution when several edges leave the same
/// prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainEdge {
    pub id: Uuid,
    #[serde(default)]
    pub from_prompt_id: Option<Uuid>,
    pub to_prompt_id: Uuid,
    /// Key -> expected value, evaluated against the previous step's output.
    #[serde(default)]
    pub condition: Map<String, Value>,
    /// Free-text operator notes, surfaced in logs when the edge is taken.
    #[serde(default)]
    pub notes: Option<String>,
    /// Listing order among edges sharing the same source prompt.
    #[serde(default)]
    pub position: i64,
}

impl ChainEdge {
    /// Whether this edge is the workflow entry edge.
    ///
    /// Entry edges have no source prompt and a truthy `start_prompt`
    /// condition key.
    pub fn is_entry(&self) -> bool {
        self.from_prompt_id.is_none()
            && self.condition.get(START_PROMPT_KEY) == Some(&Value::Bool(true))
    }
}

/// Read-only project metadata embedded into the context-enriching step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectDetails {
    pub project_name: String,
    pub created_at: DateTime<Utc>,
}
