//! termpilot CLI entry point.
//!
//! Usage:
//! - `termpilot`                   interactive session
//! - `termpilot <message...>`      one-shot mode
//! - `termpilot providers`         list LLM backends and whether they are usable
//! - `termpilot tools`             list built-in tools
//! - `termpilot config`            print the effective configuration

use clap::{Parser, Subcommand};

mod commands;
mod render;

#[derive(Parser)]
#[command(
    name = "termpilot",
    about = "AI coding assistant in your terminal",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Send a single message instead of entering interactive mode
    #[arg(trailing_var_arg = true)]
    message: Vec<String>,

    /// LLM provider: claude, openai, ollama, or demo
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List supported LLM providers
    Providers,

    /// List built-in tools
    Tools,

    /// Print the effective configuration (API keys redacted)
    Config {
        /// Print a default config file instead
        #[arg(long)]
        default: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so they never interleave with rendered output.
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Some(Commands::Providers) => commands::providers::run()?,
        Some(Commands::Tools) => commands::tools::run()?,
        Some(Commands::Config { default }) => commands::config_cmd::run(default)?,
        None => commands::chat::run(cli.model, cli.message).await?,
    }

    Ok(())
}
