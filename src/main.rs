//! # VisaMonk Gateway CLI (`vmgw`)
//!
//! The `vmgw` binary runs the HTTP gateway and provides a handful of
//! operational commands over the same pipeline store the gateway uses.
//!
//! ## Usage
//!
//! ```bash
//! vmgw --config ./config/gateway.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `vmgw init` | Create the SQLite store and run schema migrations |
//! | `vmgw serve` | Start the HTTP gateway |
//! | `vmgw workers` | List configured workers and their script health |
//! | `vmgw files` | List uploaded and scraped data assets |
//! | `vmgw reindex` | Rebuild the vector index from the current assets |
//! | `vmgw clear-data` | Wipe scraped assets, history tables, and the index |

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use visamonk_gateway::{config, migrate, server, store::PipelineStore, worker};

/// VisaMonk Gateway — an authenticated process-RPC gateway for a
/// retrieval-augmented chat assistant.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/gateway.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "vmgw",
    about = "VisaMonk Gateway — authenticated process-RPC gateway for a RAG chat assistant",
    version,
    long_about = "The gateway authenticates administrative requests, dispatches work to \
    out-of-process workers (scraping, document ingestion, chat inference, speech synthesis, \
    reindexing) over a JSON-on-stdio contract, and manages the on-disk pipeline state those \
    workers produce and consume."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/gateway.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite store and all required tables (universities,
    /// conversation_history, contact_messages). This command is
    /// idempotent — running it multiple times is safe.
    Init,

    /// Start the HTTP gateway.
    ///
    /// Runs migrations, validates that every configured worker script
    /// exists, and serves until terminated.
    Serve,

    /// List configured workers and their status.
    ///
    /// Shows which worker scripts resolve on disk. Useful for verifying
    /// configuration before serving.
    Workers,

    /// List data assets in both locations (uploaded and scraped).
    Files,

    /// Rebuild the vector index from the current asset set.
    ///
    /// Drives the reindex worker exactly like `POST /admin/reindex`.
    Reindex,

    /// Wipe scraped assets, the history tables, and the index artifacts.
    ///
    /// Uploaded source files are kept.
    ClearData,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Serve => {
            migrate::run_migrations(&cfg).await?;
            server::run_server(&cfg).await?;
        }
        Commands::Workers => {
            worker::list_workers(&cfg)?;
        }
        Commands::Files => {
            let store = PipelineStore::open(&cfg).await?;
            let assets = store.list_assets().await?;
            if assets.is_empty() {
                println!("No data assets found.");
            } else {
                println!("{:<36} {:<10} {:>12}  MODIFIED", "NAME", "LOCATION", "SIZE");
                for asset in &assets {
                    println!(
                        "{:<36} {:<10} {:>12}  {}",
                        asset.name,
                        asset.location.to_string(),
                        asset.size_bytes,
                        asset.modified_at.format("%Y-%m-%d %H:%M")
                    );
                }
            }
        }
        Commands::Reindex => {
            let store = PipelineStore::open(&cfg).await?;
            let workers = worker::ProcessWorkerPool::new(&cfg)?;
            let index = store.reindex(&workers).await?;
            println!(
                "Reindexed {} chunks from {} files.",
                index.chunk_count, index.file_count
            );
        }
        Commands::ClearData => {
            migrate::run_migrations(&cfg).await?;
            let store = PipelineStore::open(&cfg).await?;
            let warnings = store.clear_all().await;
            if warnings.is_empty() {
                println!("Database and all data cleared successfully.");
            } else {
                println!("Cleared with {} warning(s):", warnings.len());
                for warning in &warnings {
                    println!("  {}", warning);
                }
            }
        }
    }

    Ok(())
}
