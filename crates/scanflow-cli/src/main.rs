//! Scanflow CLI entry point.
//!
//! Binary name: `scanflow`
//!
//! Parses CLI arguments, initializes the database and provider chain,
//! then dispatches to the appropriate command handler.

mod check;
mod run;
mod seed;

use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use scanflow_infra::config::{data_dir, load_config};
use scanflow_infra::sqlite::{DatabasePool, SqliteChainRepository};
use scanflow_infra::sqlite::pool::default_database_url;

#[derive(Parser)]
#[command(name = "scanflow", version, about = "Prompt-chain workflow orchestrator")]
struct Cli {
    /// Increase log verbosity (-v: info, -vv: trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Machine-readable JSON output
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute one workflow run with the given JSON input
    Run {
        /// Initial context as a JSON document
        input: String,

        /// Print the provider usage report after the run
        #[arg(long)]
        report: bool,
    },

    /// Load prompts and chain edges from a JSON definition file
    Seed {
        /// Path to the chain definition file
        file: std::path::PathBuf,
    },

    /// Validate the stored chain graph
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,scanflow=debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();

    // Malformed run input must fail before any store access.
    let parsed_input = match &cli.command {
        Commands::Run { input, .. } => match serde_json::from_str::<serde_json::Value>(input) {
            Ok(value) => Some(value),
            Err(err) => {
                eprintln!(
                    "  {} invalid input JSON: {err}",
                    console::style("✗").red()
                );
                return Ok(ExitCode::FAILURE);
            }
        },
        _ => None,
    };

    let dir = data_dir();
    tokio::fs::create_dir_all(&dir).await?;
    let config = load_config(&dir).await;
    let database_url = config
        .database_url
        .clone()
        .unwrap_or_else(default_database_url);
    let pool = DatabasePool::new(&database_url).await?;
    let repo = SqliteChainRepository::new(pool);

    let code = match cli.command {
        Commands::Run { report, .. } => {
            // parsed_input is always Some for Run
            let input = parsed_input.unwrap_or_default();
            run::run(repo, &config, input, report, cli.json).await?
        }
        Commands::Seed { file } => seed::seed(&repo, &file, cli.json).await?,
        Commands::Check => check::check(&repo, cli.json).await?,
    };

    Ok(code)
}
