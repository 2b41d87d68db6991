//! `scanflow check` -- validate the stored chain graph.
//!
//! Errors (non-zero exit): no entry edge, more than one entry edge, an
//! edge whose target prompt is missing or inactive. Warnings: an edge
//! whose source prompt is missing (the edge can never fire).

use std::process::ExitCode;

use scanflow_core::repository::chain::ChainRepository;

/// Findings from one chain validation pass.
struct Findings {
    edges: usize,
    entry_edges: usize,
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl Findings {
    fn healthy(&self) -> bool {
        self.errors.is_empty()
    }
}

async fn validate<R: ChainRepository>(repo: &R) -> anyhow::Result<Findings> {
    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();

    let entries = repo.entry_edges().await?;
    match entries.len() {
        0 => errors
            .push("no entry edge (need one with null source and start_prompt: true)".to_string()),
        1 => {}
        n => errors.push(format!("{n} entry edges, expected exactly one")),
    }

    let edges = repo.all_edges().await?;
    for edge in &edges {
        if repo.prompt(&edge.to_prompt_id).await?.is_none() {
            errors.push(format!(
                "edge {} targets missing or inactive prompt {}",
                edge.id, edge.to_prompt_id
            ));
        }
        if let Some(from) = &edge.from_prompt_id {
            if repo.prompt(from).await?.is_none() {
                warnings.push(format!(
                    "edge {} has missing or inactive source prompt {} and can never fire",
                    edge.id, from
                ));
            }
        }
    }

    Ok(Findings {
        edges: edges.len(),
        entry_edges: entries.len(),
        errors,
        warnings,
    })
}

/// Validate the chain graph and report findings.
pub async fn check<R: ChainRepository>(repo: &R, json: bool) -> anyhow::Result<ExitCode> {
    let findings = validate(repo).await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "edges": findings.edges,
                "entry_edges": findings.entry_edges,
                "errors": findings.errors,
                "warnings": findings.warnings,
                "healthy": findings.healthy(),
            }))?
        );
    } else {
        println!();
        println!(
            "  {} Chain check: {} edge(s), {} entry edge(s)",
            console::style("🔍").bold(),
            findings.edges,
            findings.entry_edges
        );
        for error in &findings.errors {
            println!("  {} {error}", console::style("✗").red());
        }
        for warning in &findings.warnings {
            println!("  {} {warning}", console::style("!").yellow());
        }
        if findings.healthy() {
            println!("  {} chain is runnable", console::style("✓").green());
        }
        println!();
    }

    Ok(if findings.healthy() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
