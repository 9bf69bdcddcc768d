use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use taxdesk_cli::{Cli, run};
use taxdesk_db_sqlite::SqliteRepository;

/// Initialise the tracing subscriber.
///
/// * Honours `RUST_LOG` when set.
/// * Falls back to `info`.
/// * Strips timestamps and target names to keep CLI output clean.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::from("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .without_time()
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let db_config = cli.db_config();

    debug!(database = %db_config.connection_string, "opening database");
    let repo = SqliteRepository::connect(&db_config)
        .await
        .with_context(|| format!("Failed to open database: {}", db_config.connection_string))?;

    let outcome = run(&repo, cli.command).await;
    repo.shutdown().await;

    println!("{}", outcome?);
    Ok(())
}
