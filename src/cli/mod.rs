pub mod commands;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "cards-api")]
#[command(about = "Cards API - user-owned cards with JWT auth and AI-assisted generation")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Start the HTTP server (default)")]
    Serve(commands::serve::ServeArgs),

    #[command(about = "Create the users and cards tables if they do not exist")]
    Migrate,
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::from_env();
    tracing::debug!("Loaded {:?} configuration", config.environment);

    match cli.command.unwrap_or_default() {
        Commands::Serve(args) => commands::serve::handle(args, config).await,
        Commands::Migrate => commands::migrate::handle(config).await,
    }
}

impl Default for Commands {
    fn default() -> Self {
        Commands::Serve(commands::serve::ServeArgs::default())
    }
}
