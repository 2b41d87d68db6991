//! Chain store accessor.
//!
//! Exposes the chain graph as two operations: `load_start` (the unique
//! entry edge) and `find_next` (first-match conditional edge resolution).
//!
//! First-match is a policy, not an accident: ties among multiple
//! satisfiable edges are broken by listing order (`position`), which
//! operators control store-side. Absence of a matching edge is the
//! designed end-of-workflow signal and is never an error.

use serde_json::{Map, Value};
use uuid::Uuid;

use scanflow_types::chain::{ChainEdge, Prompt, START_PROMPT_KEY};
use scanflow_types::error::WorkflowError;

use crate::repository::chain::ChainRepository;

/// Read-side accessor over a [`ChainRepository`].
pub struct ChainStore<R: ChainRepository> {
    repo: R,
}

impl<R: ChainRepository> ChainStore<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// The underlying repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Resolve the unique entry edge and its target prompt.
    ///
    /// Zero entry edges is [`WorkflowError::NoStartPoint`]; more than
    /// one is [`WorkflowError::MultipleStartPoints`]. The count is
    /// validated explicitly here rather than relying on the store's
    /// single-row fetch semantics.
    pub async fn load_start(&self) -> Result<(ChainEdge, Prompt), WorkflowError> {
        let entries = self.repo.entry_edges().await?;

        let edge = match entries.len() {
            0 => return Err(WorkflowError::NoStartPoint),
            1 => entries.into_iter().next().expect("len checked"),
            n => return Err(WorkflowError::MultipleStartPoints(n)),
        };

        let prompt = self
            .repo
            .prompt(&edge.to_prompt_id)
            .await?
            .ok_or(WorkflowError::PromptNotFound(edge.to_prompt_id))?;

        tracing::info!(prompt = %prompt.title, "resolved workflow start point");
        Ok((edge, prompt))
    }

    /// Find the next prompt after `from`, given the previous step's
    /// parsed JSON output.
    ///
    /// Edges are evaluated in listing order; the first edge whose
    /// condition matches wins. `Ok(None)` means the workflow has reached
    /// its designed end.
    pub async fn find_next(
        &self,
        from: &Uuid,
        output: &Map<String, Value>,
    ) -> Result<Option<Prompt>, WorkflowError> {
        let edges = self.repo.edges_from(from).await?;

        for edge in edges {
            if !condition_matches(&edge.condition, output) {
                continue;
            }

            let prompt = self
                .repo
                .prompt(&edge.to_prompt_id)
                .await?
                .ok_or(WorkflowError::PromptNotFound(edge.to_prompt_id))?;

            tracing::info!(
                next = %prompt.title,
                notes = edge.notes.as_deref().unwrap_or("proceeding"),
                "condition matched"
            );
            return Ok(Some(prompt));
        }

        Ok(None)
    }
}

/// Evaluate an edge condition against a step's parsed JSON output.
///
/// Every condition key except the reserved `start_prompt` marker must be
/// present in `output` with an exactly equal value. An empty condition
/// matches unconditionally.
pub fn condition_matches(condition: &Map<String, Value>, output: &Map<String, Value>) -> bool {
    condition
        .iter()
        .filter(|(key, _)| key.as_str() != START_PROMPT_KEY)
        .all(|(key, expected)| output.get(key) == Some(expected))
}
