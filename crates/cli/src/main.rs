//! rolecast CLI: the main entry point.
//!
//! Commands:
//! - `onboard` : Initialize config directory and a default config file
//! - `chat`    : Role-play chat, interactive or single-message
//! - `build-db`: Embed a folder of story passages and save the database
//! - `config`  : Validate, show, locate or health-check the configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "rolecast",
    about = "rolecast: role-play chat with retrieved story context",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration
    Onboard,

    /// Chat with a character
    Chat(commands::chat::ChatArgs),

    /// Build a story database from a folder of .txt files
    BuildDb {
        /// Folder of story passages, one per .txt file
        #[arg(short, long)]
        folder: PathBuf,

        /// Where to write the story database
        #[arg(short, long)]
        output: PathBuf,

        /// Backend whose embedder to use
        #[arg(short, long)]
        backend: Option<String>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Validate the configuration (default)
    Validate,
    /// Print the effective configuration as TOML
    Show,
    /// Print the config file path
    Path,
    /// Check that each remote backend is reachable
    Check,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Chat(args) => commands::chat::run(args).await?,
        Commands::BuildDb {
            folder,
            output,
            backend,
        } => commands::build_db::run(folder, output, backend).await?,
        Commands::Config { action } => match action.unwrap_or(ConfigAction::Validate) {
            ConfigAction::Validate => commands::config_cmd::validate().await?,
            ConfigAction::Show => commands::config_cmd::show().await?,
            ConfigAction::Path => commands::config_cmd::path().await?,
            ConfigAction::Check => commands::config_cmd::check().await?,
        },
    }

    Ok(())
}
