//! `scanflow run` -- execute one workflow run.

use std::process::ExitCode;

use scanflow_core::llm::FallbackExecutor;
use scanflow_core::repository::chain::ChainRepository;
use scanflow_core::workflow::WorkflowEngine;
use scanflow_infra::llm::build_providers;
use scanflow_types::config::OrchestratorConfig;

/// Run the workflow with the given input and print the result.
///
/// Exit code mirrors the result: zero only when the run succeeded.
pub async fn run<R: ChainRepository>(
    repo: R,
    config: &OrchestratorConfig,
    input: serde_json::Value,
    report: bool,
    json: bool,
) -> anyhow::Result<ExitCode> {
    let providers = build_providers(&config.providers);
    if providers.is_empty() {
        eprintln!(
            "  {} no usable providers configured (check config.toml and API key env vars)",
            console::style("✗").red()
        );
        return Ok(ExitCode::FAILURE);
    }

    let executor = FallbackExecutor::new(providers);
    let mut engine = WorkflowEngine::new(repo, executor, config);

    let result = engine.execute(input).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!();
        if result.success {
            println!(
                "  {} Workflow completed in {} step(s)",
                console::style("✓").green(),
                result.total_steps
            );
            if let Some(output) = &result.final_output {
                println!();
                println!("{}", serde_json::to_string_pretty(output)?);
            }
        } else {
            println!(
                "  {} Workflow failed after {} step(s): {}",
                console::style("✗").red(),
                result.total_steps,
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
        println!();
    }

    if report {
        let usage = engine.usage_report();
        if json {
            println!("{}", serde_json::to_string_pretty(&usage)?);
        } else {
            println!(
                "  {} usage: {}/{} requests succeeded ({}), est. cost ${}",
                console::style("▸").bold(),
                usage.successful_requests,
                usage.total_requests,
                usage.success_rate,
                usage.total_estimated_cost
            );
            for entry in &usage.recent_usage {
                let mark = if entry.success {
                    format!("{}", console::style("✓").green())
                } else {
                    format!("{}", console::style("✗").red())
                };
                println!(
                    "    {mark} {} {}ms  {}",
                    entry.provider, entry.duration_ms, entry.task
                );
            }
            println!();
        }
    }

    Ok(if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
