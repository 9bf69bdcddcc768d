//! Drives the command layer end to end against an in-memory database.

use clap::Parser;
use pretty_assertions::assert_eq;
use taxdesk_cli::{Cli, run};
use taxdesk_core::{DbConfig, DomainViolation, RepositoryError};
use taxdesk_db_sqlite::SqliteRepository;

async fn setup() -> SqliteRepository {
    SqliteRepository::connect(&DbConfig::default())
        .await
        .expect("Failed to open in-memory database")
}

async fn exec(
    repo: &SqliteRepository,
    args: &[&str],
) -> Result<String, RepositoryError> {
    let cli = Cli::try_parse_from(std::iter::once("taxdesk").chain(args.iter().copied()))
        .expect("arguments should parse");
    run(repo, cli.command).await
}

#[tokio::test]
async fn test_add_and_list_people() {
    let repo = setup().await;

    assert_eq!(exec(&repo, &["preparer", "add", "Jane"]).await, Ok("Added preparer 1.".to_string()));
    assert_eq!(exec(&repo, &["assistant", "add", "Sam"]).await, Ok("Added assistant 1.".to_string()));
    exec(&repo, &["preparer", "rename", "1", "Jane Doe"])
        .await
        .expect("Should rename");

    assert_eq!(
        exec(&repo, &["preparer", "list"]).await,
        Ok("   1  Jane Doe".to_string())
    );
    assert_eq!(exec(&repo, &["assistant", "get", "1"]).await, Ok("   1  Sam".to_string()));
}

#[tokio::test]
async fn test_client_lifecycle() {
    let repo = setup().await;
    exec(&repo, &["preparer", "add", "Jane"]).await.expect("Should add");

    assert_eq!(
        exec(
            &repo,
            &["client", "add", "Bob", "--income", "40000", "--preparer", "1"]
        )
        .await,
        Ok("Added client 1.".to_string())
    );
    assert_eq!(
        exec(&repo, &["client", "update", "1", "materials_submitted", "yes"]).await,
        Ok("Updated materials_submitted of client 1.".to_string())
    );
    assert_eq!(
        exec(&repo, &["client", "list", "--preparer", "1"]).await,
        Ok("   1  Bob  address=-  income=40000.00  materials_submitted=true  preparer=1"
            .to_string())
    );
}

#[tokio::test]
async fn test_unknown_client_field_is_rejected() {
    let repo = setup().await;
    exec(&repo, &["client", "add", "Bob"]).await.expect("Should add");

    let result = exec(&repo, &["client", "update", "1", "id", "7"]).await;

    assert_eq!(
        result,
        Err(RepositoryError::DomainInvariantViolation(
            DomainViolation::UnknownField {
                entity: "client",
                field: "id".to_string(),
            }
        ))
    );
}

#[tokio::test]
async fn test_return_workflow() {
    let repo = setup().await;
    exec(&repo, &["client", "add", "Bob"]).await.expect("Should add");

    assert_eq!(
        exec(&repo, &["return", "add", "1"]).await,
        Ok("Added tax return 1 for client 1.".to_string())
    );
    let duplicate = exec(&repo, &["return", "add", "1"]).await;
    assert_eq!(
        duplicate.map_err(|e| e.to_string()),
        Err("Client 1 already has a tax return".to_string())
    );

    exec(&repo, &["return", "check", "1"]).await.expect("Should check");
    exec(&repo, &["return", "file-by-assistant", "1"])
        .await
        .expect("Should file");

    let shown = exec(&repo, &["return", "get", "1", "--by-client"])
        .await
        .expect("Should show");
    assert!(shown.contains("filed=true"), "{shown}");
    assert!(shown.contains("checked_by_preparer=false"), "{shown}");
    assert!(shown.contains("filed_by_assistant=true"), "{shown}");
}

#[tokio::test]
async fn test_missing_return_reports_not_found() {
    let repo = setup().await;

    let result = exec(&repo, &["return", "file", "4"]).await;

    assert_eq!(
        result.map_err(|e| e.to_string()),
        Err("tax return 4 not found".to_string())
    );
}

#[tokio::test]
async fn test_init_reports_tables() {
    let repo = setup().await;

    assert_eq!(
        exec(&repo, &["init"]).await,
        Ok("Database ready. Tables: assistants, clients, preparers, tax_returns".to_string())
    );
}

#[tokio::test]
async fn test_empty_lists() {
    let repo = setup().await;

    assert_eq!(exec(&repo, &["return", "list"]).await, Ok("(none)".to_string()));
    assert_eq!(exec(&repo, &["client", "list"]).await, Ok("(none)".to_string()));
}
