use taxdesk_core::RepositoryError;
use tracing::info;

use crate::executor::{QueryExecutor, Statement};

/// Table definitions in dependency order: tables without outbound references
/// first, then `clients` (→ preparers), then `tax_returns` (→ clients).
pub const TABLES: [Statement; 4] = [
    Statement::new(
        "create preparers table",
        "CREATE TABLE IF NOT EXISTS preparers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name VARCHAR(100) NOT NULL
        )",
    ),
    Statement::new(
        "create assistants table",
        "CREATE TABLE IF NOT EXISTS assistants (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name VARCHAR(100) NOT NULL
        )",
    ),
    Statement::new(
        "create clients table",
        "CREATE TABLE IF NOT EXISTS clients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name VARCHAR(100) NOT NULL,
            address VARCHAR(255),
            income DECIMAL(10, 2),
            materials_submitted BOOLEAN NOT NULL DEFAULT FALSE,
            preparer_id INTEGER REFERENCES preparers(id)
        )",
    ),
    Statement::new(
        "create tax_returns table",
        "CREATE TABLE IF NOT EXISTS tax_returns (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            client_id INTEGER NOT NULL UNIQUE REFERENCES clients(id),
            status BOOLEAN NOT NULL DEFAULT FALSE,
            filing_timestamp TIMESTAMP,
            checked_by_preparer BOOLEAN NOT NULL DEFAULT FALSE,
            filed_by_assistant BOOLEAN NOT NULL DEFAULT FALSE
        )",
    ),
];

/// After any delete, set the table's AUTOINCREMENT counter to the highest id
/// still present, so the next insert continues from there. Runs inside the
/// deleting statement's transaction.
pub const RESEQUENCE_TRIGGERS: [Statement; 4] = [
    Statement::new(
        "create preparers resequence trigger",
        "CREATE TRIGGER IF NOT EXISTS preparers_resequence
         AFTER DELETE ON preparers
         BEGIN
             UPDATE sqlite_sequence
             SET seq = (SELECT COALESCE(MAX(id), 0) FROM preparers)
             WHERE name = 'preparers';
         END",
    ),
    Statement::new(
        "create assistants resequence trigger",
        "CREATE TRIGGER IF NOT EXISTS assistants_resequence
         AFTER DELETE ON assistants
         BEGIN
             UPDATE sqlite_sequence
             SET seq = (SELECT COALESCE(MAX(id), 0) FROM assistants)
             WHERE name = 'assistants';
         END",
    ),
    Statement::new(
        "create clients resequence trigger",
        "CREATE TRIGGER IF NOT EXISTS clients_resequence
         AFTER DELETE ON clients
         BEGIN
             UPDATE sqlite_sequence
             SET seq = (SELECT COALESCE(MAX(id), 0) FROM clients)
             WHERE name = 'clients';
         END",
    ),
    Statement::new(
        "create tax_returns resequence trigger",
        "CREATE TRIGGER IF NOT EXISTS tax_returns_resequence
         AFTER DELETE ON tax_returns
         BEGIN
             UPDATE sqlite_sequence
             SET seq = (SELECT COALESCE(MAX(id), 0) FROM tax_returns)
             WHERE name = 'tax_returns';
         END",
    ),
];

const LIST_TABLES: Statement = Statement::new(
    "list tables",
    "SELECT name FROM sqlite_master
     WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
     ORDER BY name",
);

/// Create any missing tables and triggers. Safe to call on every start;
/// existing tables are never altered.
pub async fn create_schema(executor: &QueryExecutor) -> Result<(), RepositoryError> {
    for statement in TABLES.iter().chain(&RESEQUENCE_TRIGGERS) {
        executor.write(statement, &[]).await?;
    }
    info!(
        tables = TABLES.len(),
        triggers = RESEQUENCE_TRIGGERS.len(),
        "schema ready"
    );
    Ok(())
}

/// Names of the user tables currently in the database, sorted.
pub async fn table_names(executor: &QueryExecutor) -> Result<Vec<String>, RepositoryError> {
    executor
        .fetch_all(&LIST_TABLES, &[])
        .await?
        .iter()
        .map(|row| row.get_string("name"))
        .collect()
}
