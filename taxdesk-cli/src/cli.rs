use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use taxdesk_core::{DbConfig, PoolConfig};

/// Record keeping for a small tax preparation office.
///
/// Every command opens the database, creates any missing tables, performs
/// one operation, and prints the result.
#[derive(Debug, Parser)]
#[command(name = "taxdesk", version, about)]
pub struct Cli {
    /// Database connection string: a file path (e.g. `taxdesk.db`), a
    /// `sqlite:` URL, or `sqlite::memory:`.
    #[arg(long, env = "TAXDESK_DATABASE", default_value = "taxdesk.db", global = true)]
    pub database: String,

    /// Connections opened at startup.
    #[arg(long, env = "TAXDESK_MIN_CONNECTIONS", default_value_t = 1, global = true)]
    pub min_connections: u32,

    /// Upper bound on open connections.
    #[arg(long, env = "TAXDESK_MAX_CONNECTIONS", default_value_t = 10, global = true)]
    pub max_connections: u32,

    /// Seconds to wait for a free connection before giving up.
    #[arg(long, env = "TAXDESK_ACQUIRE_TIMEOUT_SECS", default_value_t = 30, global = true)]
    pub acquire_timeout_secs: u64,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database).with_pool(PoolConfig {
            min_connections: self.min_connections,
            max_connections: self.max_connections,
            acquire_timeout: Duration::from_secs(self.acquire_timeout_secs),
        })
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create the tables if they do not exist yet.
    Init,
    /// Manage tax preparers.
    #[command(subcommand)]
    Preparer(NamedCommand),
    /// Manage filing assistants.
    #[command(subcommand)]
    Assistant(NamedCommand),
    /// Manage clients.
    #[command(subcommand)]
    Client(ClientCommand),
    /// Manage tax returns.
    #[command(subcommand)]
    Return(ReturnCommand),
}

/// Preparers and assistants only carry a name.
#[derive(Debug, Subcommand)]
pub enum NamedCommand {
    Add { name: String },
    Get { id: i64 },
    List,
    Rename { id: i64, name: String },
    Delete { id: i64 },
}

#[derive(Debug, Subcommand)]
pub enum ClientCommand {
    Add(NewClientArgs),
    Get {
        id: i64,
    },
    List {
        /// Only clients assigned to this preparer.
        #[arg(long)]
        preparer: Option<i64>,
    },
    /// Change one column. Fields: name, address, income,
    /// materials_submitted, preparer_id. An empty value clears an optional
    /// column.
    Update {
        id: i64,
        field: String,
        value: String,
    },
    Delete {
        id: i64,
    },
}

#[derive(Debug, Args)]
pub struct NewClientArgs {
    pub name: String,
    #[arg(long)]
    pub address: Option<String>,
    #[arg(long)]
    pub income: Option<Decimal>,
    #[arg(long)]
    pub preparer: Option<i64>,
}

#[derive(Debug, Subcommand)]
pub enum ReturnCommand {
    /// Open an unfiled return for a client.
    Add { client_id: i64 },
    Get {
        id: i64,
        /// Treat the id as a client id and look up that client's return.
        #[arg(long)]
        by_client: bool,
    },
    List,
    /// Change one column. Fields: status, filing_timestamp (RFC 3339),
    /// checked_by_preparer, filed_by_assistant.
    Update {
        id: i64,
        field: String,
        value: String,
    },
    /// Mark filed now.
    File { id: i64 },
    /// Record the preparer's review.
    Check { id: i64 },
    /// Mark filed now by an assistant. Clears the preparer's review.
    FileByAssistant { id: i64 },
    Delete { id: i64 },
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn pool_flags_build_config() {
        let cli = Cli::try_parse_from([
            "taxdesk",
            "--database",
            "sqlite::memory:",
            "--max-connections",
            "4",
            "--acquire-timeout-secs",
            "2",
            "init",
        ])
        .expect("Should parse");

        assert_eq!(
            cli.db_config(),
            DbConfig::new("sqlite::memory:").with_pool(PoolConfig {
                min_connections: 1,
                max_connections: 4,
                acquire_timeout: Duration::from_secs(2),
            })
        );
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "taxdesk",
            "return",
            "file-by-assistant",
            "3",
            "--database",
            "office.db",
        ])
        .expect("Should parse");

        assert_eq!(cli.database, "office.db");
        assert!(matches!(
            cli.command,
            Command::Return(ReturnCommand::FileByAssistant { id: 3 })
        ));
    }

    #[test]
    fn client_income_must_be_decimal() {
        let result =
            Cli::try_parse_from(["taxdesk", "client", "add", "Bob", "--income", "lots"]);

        assert!(result.is_err());
    }
}
