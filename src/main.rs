//! Thicket CLI entry point

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "thicket")]
#[command(about = "Incremental code-graph indexer producing searchable code skeletons", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Workspace root path (defaults to current directory)
    #[arg(short, long, default_value = ".", global = true)]
    root: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Index files and exit; with no paths, index the whole workspace
    Index {
        /// Files to (re)index, absolute or relative to the root
        paths: Vec<PathBuf>,

        /// Ask the store to prune documents of files no longer indexed
        #[arg(long)]
        full: bool,
    },
    /// Index the workspace, then re-index on every change
    Watch,
    /// Show what the local graph snapshot holds
    Status,
    /// Clear the cache
    Clear,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(
            ["thicket", "thicket_core", "thicket_parser", "thicket_ai", "thicket_sync"]
                .map(|target| format!("{target}={log_level}"))
                .join(","),
        )
    });
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::debug!("Thicket v{}", env!("CARGO_PKG_VERSION"));
    tracing::debug!("Workspace root: {}", cli.root.display());

    match cli.command {
        Commands::Index { paths, full } => commands::index(cli.root, paths, full).await,
        Commands::Watch => commands::watch(cli.root).await,
        Commands::Status => commands::status(cli.root).await,
        Commands::Clear => commands::clear(cli.root),
        Commands::Version => {
            println!("Thicket v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
