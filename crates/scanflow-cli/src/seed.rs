//! `scanflow seed` -- load a chain definition into the database.
//!
//! The definition file is JSON: a prompt list plus an edge list where
//! edges reference prompts by title. Explicit ids are optional and make
//! re-seeding idempotent.

use std::collections::HashMap;
use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use serde::Deserialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use scanflow_core::repository::chain::ChainRepository;
use scanflow_infra::sqlite::SqliteChainRepository;
use scanflow_types::chain::{ChainEdge, Prompt};

#[derive(Debug, Deserialize)]
struct SeedFile {
    #[serde(default)]
    project: Option<SeedProject>,
    prompts: Vec<SeedPrompt>,
    #[serde(default)]
    edges: Vec<SeedEdge>,
}

#[derive(Debug, Deserialize)]
struct SeedProject {
    id: Uuid,
    name: String,
}

#[derive(Debug, Deserialize)]
struct SeedPrompt {
    #[serde(default)]
    id: Option<Uuid>,
    title: String,
    body: String,
    #[serde(default = "default_true")]
    active: bool,
}

#[derive(Debug, Deserialize)]
struct SeedEdge {
    #[serde(default)]
    id: Option<Uuid>,
    /// Source prompt title. Absent for the entry edge.
    #[serde(default)]
    from: Option<String>,
    /// Target prompt title.
    to: String,
    #[serde(default)]
    condition: Map<String, Value>,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    position: Option<i64>,
}

fn default_true() -> bool {
    true
}

/// Resolve a seed file into storable prompts and edges.
///
/// Edge endpoints are resolved against the titles defined in the same
/// file; an unknown title is an error.
fn resolve(seed: SeedFile) -> anyhow::Result<(Vec<Prompt>, Vec<ChainEdge>)> {
    let prompts: Vec<Prompt> = seed
        .prompts
        .into_iter()
        .map(|p| Prompt {
            id: p.id.unwrap_or_else(Uuid::now_v7),
            title: p.title,
            body: p.body,
            active: p.active,
        })
        .collect();

    let by_title: HashMap<&str, Uuid> =
        prompts.iter().map(|p| (p.title.as_str(), p.id)).collect();
    let lookup = |title: &str| -> anyhow::Result<Uuid> {
        by_title
            .get(title)
            .copied()
            .with_context(|| format!("edge references unknown prompt title '{title}'"))
    };

    let edges = seed
        .edges
        .into_iter()
        .enumerate()
        .map(|(idx, e)| {
            Ok(ChainEdge {
                id: e.id.unwrap_or_else(Uuid::now_v7),
                from_prompt_id: e.from.as_deref().map(&lookup).transpose()?,
                to_prompt_id: lookup(&e.to)?,
                condition: e.condition,
                notes: e.notes,
                position: e.position.unwrap_or(idx as i64),
            })
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok((prompts, edges))
}

/// Parse and load a chain definition file.
pub async fn seed(
    repo: &SqliteChainRepository,
    file: &Path,
    json: bool,
) -> anyhow::Result<ExitCode> {
    let content = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let parsed: SeedFile = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {}", file.display()))?;

    let project = parsed
        .project
        .as_ref()
        .map(|p| (p.id, p.name.clone()));
    let (prompts, edges) = resolve(parsed)?;

    if let Some((id, name)) = &project {
        repo.upsert_project(id, name).await?;
    }
    for prompt in &prompts {
        repo.upsert_prompt(prompt).await?;
    }
    for edge in &edges {
        repo.upsert_edge(edge).await?;
    }

    if json {
        println!(
            "{}",
            serde_json::json!({
                "prompts": prompts.len(),
                "edges": edges.len(),
                "project": project.is_some(),
            })
        );
    } else {
        println!();
        println!(
            "  {} Seeded {} prompt(s) and {} edge(s) from {}",
            console::style("✓").green(),
            prompts.len(),
            edges.len(),
            file.display()
        );
        println!();
    }

    Ok(ExitCode::SUCCESS)
}
