//! TinyAgent CLI, the main entry point.
//!
//! Commands:
//! - `run`    Run one instruction and print the answer
//! - `chat`   Line-based interactive session
//! - `tools`  List the available tools
//! - `init`   Write a default config file

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "tinyagent",
    about = "TinyAgent: a minimal tool-using LLM agent",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Read configuration from this file instead of ~/.tinyagent/config.toml
    #[arg(short, long, global = true, env = "TINYAGENT_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single instruction to completion
    Run {
        /// The instruction to give the agent
        #[arg(required_unless_present = "task_file")]
        prompt: Option<String>,

        /// Read the instruction from a file
        #[arg(short, long, conflicts_with = "prompt")]
        task_file: Option<PathBuf>,
    },

    /// Start an interactive session
    Chat,

    /// List the available tools
    Tools,

    /// Write a default config file (to --config if given)
    Init,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // stdout carries the agent's answer, so logs go to stderr
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Run { prompt, task_file } => {
            let config = commands::load_config(config_path)?;
            commands::run::run(&config, prompt, task_file).await?
        }
        Commands::Chat => commands::chat::run(&commands::load_config(config_path)?).await?,
        Commands::Tools => commands::tools::run(&commands::load_config(config_path)?),
        Commands::Init => commands::init::run(config_path)?,
    }

    Ok(())
}
