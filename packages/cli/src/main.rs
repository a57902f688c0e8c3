mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Operator commands for the plugin registry.
#[derive(Parser)]
#[command(name = "registry", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a fresh encryption key for `secrets.encryption_key`
    GenerateKey,

    /// Import plugin descriptors from disk as approved plugins
    Import {
        /// `plugin.yaml` files, or directories containing one
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Create the initial admin account if none exists
    CreateAdmin {
        #[arg(long)]
        username: String,
        #[arg(long, env = "REGISTRY_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::GenerateKey => commands::generate_key::run(),
        Commands::Import { paths } => commands::import::run(&paths).await,
        Commands::CreateAdmin { username, password } => {
            commands::create_admin::run(&username, &password).await
        }
    }
}
