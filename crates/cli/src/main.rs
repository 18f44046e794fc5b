//! prbot CLI, the CI entry point.
//!
//! Commands:
//! - `review`: Review the pull request named by the CI event
//! - `prompt`: Print the assembled system instruction
//! - `config`: Print the effective configuration (secrets omitted)

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "prbot",
    about = "prbot: LLM-assisted pull request review for CI",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// TOML config file (overrides PRBOT_CONFIG)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Review the pull request described by GITHUB_EVENT_PATH
    Review {
        /// Override the review mode (simple, agentic, agentic_tools)
        #[arg(short, long)]
        mode: Option<String>,

        /// Override the output mode (comment, log)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Print the system instruction for the configured domain and mode
    Prompt {
        /// Override the review mode
        #[arg(short, long)]
        mode: Option<String>,

        /// Override the domain tag
        #[arg(short, long)]
        domain: Option<String>,
    },

    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries review text in log mode
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Review { mode, output } => commands::review::run(config, mode, output).await?,
        Commands::Prompt { mode, domain } => commands::prompt::run(config, mode, domain)?,
        Commands::Config => commands::config_cmd::run(config)?,
    }

    Ok(())
}
