use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteConnection};
use sqlx::{Connection, Sqlite};
use taxdesk_core::{ConstraintKind, RepositoryError};
use tracing::{debug, error, warn};

use crate::pool::ConnectionPool;
use crate::row::{Row, SqlValue};

/// Static SQL text plus a short description of what it is for. The intent is
/// what shows up in logs and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Statement {
    pub intent: &'static str,
    pub sql: &'static str,
}

impl Statement {
    pub const fn new(
        intent: &'static str,
        sql: &'static str,
    ) -> Self {
        Self { intent, sql }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    Write,
    FetchOne,
    FetchAll,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutput {
    Written { rows_affected: u64 },
    /// `None` when the statement produced no rows.
    One(Option<Row>),
    All(Vec<Row>),
}

/// Runs every statement the repositories issue.
///
/// Each call borrows one connection, wraps the statement in its own
/// transaction, and always hands the connection back. Reads commit too, so a
/// connection never returns to the pool inside an open transaction.
#[derive(Debug, Clone)]
pub struct QueryExecutor {
    pool: ConnectionPool,
}

impl QueryExecutor {
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    pub async fn execute(
        &self,
        statement: &Statement,
        params: &[SqlValue],
        mode: FetchMode,
    ) -> Result<QueryOutput, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        debug!(intent = statement.intent, ?mode, "executing statement");

        let result = run_in_transaction(&mut conn, statement, params, mode).await;

        self.pool.release(conn);
        result
    }

    /// Execute and commit; returns the number of rows changed.
    pub async fn write(
        &self,
        statement: &Statement,
        params: &[SqlValue],
    ) -> Result<u64, RepositoryError> {
        match self.execute(statement, params, FetchMode::Write).await? {
            QueryOutput::Written { rows_affected } => Ok(rows_affected),
            other => Err(unexpected_output(statement, &other)),
        }
    }

    pub async fn fetch_one(
        &self,
        statement: &Statement,
        params: &[SqlValue],
    ) -> Result<Option<Row>, RepositoryError> {
        match self.execute(statement, params, FetchMode::FetchOne).await? {
            QueryOutput::One(row) => Ok(row),
            other => Err(unexpected_output(statement, &other)),
        }
    }

    pub async fn fetch_all(
        &self,
        statement: &Statement,
        params: &[SqlValue],
    ) -> Result<Vec<Row>, RepositoryError> {
        match self.execute(statement, params, FetchMode::FetchAll).await? {
            QueryOutput::All(rows) => Ok(rows),
            other => Err(unexpected_output(statement, &other)),
        }
    }
}

async fn run_in_transaction(
    conn: &mut SqliteConnection,
    statement: &Statement,
    params: &[SqlValue],
    mode: FetchMode,
) -> Result<QueryOutput, RepositoryError> {
    let mut tx = conn
        .begin()
        .await
        .map_err(|e| query_failure(statement, e))?;

    let outcome = run(&mut tx, statement, params, mode).await;
    let outcome = match outcome {
        Ok(output) => tx
            .commit()
            .await
            .map(|()| output)
            .map_err(|e| query_failure(statement, e)),
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(intent = statement.intent, error = %rollback_err, "rollback failed");
            }
            Err(err)
        }
    };

    if let Err(err) = &outcome {
        error!(
            intent = statement.intent,
            sql = statement.sql,
            error = %err,
            "statement failed; transaction rolled back"
        );
    }
    outcome
}

async fn run(
    conn: &mut SqliteConnection,
    statement: &Statement,
    params: &[SqlValue],
    mode: FetchMode,
) -> Result<QueryOutput, RepositoryError> {
    let query = bind_params(sqlx::query(statement.sql), params);

    match mode {
        FetchMode::Write => {
            let result = query
                .execute(conn)
                .await
                .map_err(|e| query_failure(statement, e))?;
            Ok(QueryOutput::Written {
                rows_affected: result.rows_affected(),
            })
        }
        FetchMode::FetchOne => {
            let row = query
                .fetch_optional(conn)
                .await
                .map_err(|e| query_failure(statement, e))?;
            Ok(QueryOutput::One(row.as_ref().map(Row::from_sqlite).transpose()?))
        }
        FetchMode::FetchAll => {
            let rows = query
                .fetch_all(conn)
                .await
                .map_err(|e| query_failure(statement, e))?;
            let rows = rows
                .iter()
                .map(Row::from_sqlite)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(QueryOutput::All(rows))
        }
    }
}

fn bind_params<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    params: &[SqlValue],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for param in params {
        query = match param {
            SqlValue::Null => query.bind(None::<i64>),
            SqlValue::Bool(v) => query.bind(*v),
            SqlValue::Integer(v) => query.bind(*v),
            SqlValue::Decimal(v) => query.bind(v.to_string()),
            SqlValue::Text(v) => query.bind(v.clone()),
            SqlValue::Timestamp(v) => query.bind(*v),
        };
    }
    query
}

fn query_failure(
    statement: &Statement,
    err: sqlx::Error,
) -> RepositoryError {
    let constraint = match &err {
        sqlx::Error::Database(db_err) => match db_err.kind() {
            sqlx::error::ErrorKind::UniqueViolation => Some(ConstraintKind::Unique),
            sqlx::error::ErrorKind::ForeignKeyViolation => Some(ConstraintKind::ForeignKey),
            sqlx::error::ErrorKind::NotNullViolation => Some(ConstraintKind::NotNull),
            sqlx::error::ErrorKind::CheckViolation => Some(ConstraintKind::Check),
            _ => None,
        },
        _ => None,
    };

    RepositoryError::QueryExecution {
        intent: statement.intent,
        message: err.to_string(),
        constraint,
    }
}

fn unexpected_output(
    statement: &Statement,
    output: &QueryOutput,
) -> RepositoryError {
    RepositoryError::Decode(format!(
        "'{}' produced unexpected output {output:?}",
        statement.intent
    ))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use taxdesk_core::{DbConfig, PoolConfig};

    use super::*;
    use crate::row::Value;

    const CREATE: Statement = Statement::new(
        "create ledger table",
        "CREATE TABLE ledger (
            id INTEGER PRIMARY KEY,
            memo TEXT NOT NULL UNIQUE,
            amount DECIMAL(10, 2),
            posted BOOLEAN NOT NULL DEFAULT FALSE
        )",
    );
    const INSERT: Statement = Statement::new(
        "insert ledger entry",
        "INSERT INTO ledger (memo, amount, posted) VALUES (?, ?, ?) RETURNING id",
    );
    const INSERT_PAIR: Statement = Statement::new(
        "insert two ledger entries",
        "INSERT INTO ledger (memo) VALUES (?), (?)",
    );
    const SELECT_ONE: Statement = Statement::new(
        "get ledger entry",
        "SELECT id, memo, amount, posted FROM ledger WHERE id = ?",
    );
    const SELECT_ALL: Statement = Statement::new(
        "list ledger entries",
        "SELECT id, memo FROM ledger ORDER BY id",
    );
    const COUNT: Statement = Statement::new("count ledger entries", "SELECT COUNT(*) AS n FROM ledger");

    async fn setup_executor(max_connections: u32) -> QueryExecutor {
        let config = DbConfig::new("sqlite::memory:").with_pool(PoolConfig {
            min_connections: 1,
            max_connections,
            acquire_timeout: Duration::from_millis(500),
        });
        let pool = ConnectionPool::connect(&config)
            .await
            .expect("Failed to open pool");
        let executor = QueryExecutor::new(pool);
        executor
            .write(&CREATE, &[])
            .await
            .expect("Failed to create test table");
        executor
    }

    async fn count(executor: &QueryExecutor) -> i64 {
        executor
            .fetch_one(&COUNT, &[])
            .await
            .expect("Failed to count")
            .expect("COUNT always returns a row")
            .get_i64("n")
            .expect("n should be an integer")
    }

    #[tokio::test]
    async fn test_fetch_one_returns_bound_values() {
        let executor = setup_executor(2).await;

        let id = executor
            .fetch_one(&INSERT, &["rent".into(), dec!(1200.50).into(), true.into()])
            .await
            .expect("Failed to insert")
            .expect("RETURNING should produce a row")
            .get_i64("id")
            .expect("id should be an integer");

        let row = executor
            .fetch_one(&SELECT_ONE, &[id.into()])
            .await
            .expect("Failed to select")
            .expect("row should exist");

        assert_eq!(row.get_string("memo"), Ok("rent".to_string()));
        assert_eq!(row.get_decimal("amount"), Ok(dec!(1200.50)));
        assert_eq!(row.get_bool("posted"), Ok(true));
    }

    #[tokio::test]
    async fn test_fetch_one_not_found_is_none() {
        let executor = setup_executor(2).await;

        let row = executor
            .fetch_one(&SELECT_ONE, &[99_i64.into()])
            .await
            .expect("Query should succeed");

        assert_eq!(row, None);
    }

    #[tokio::test]
    async fn test_fetch_all_preserves_order() {
        let executor = setup_executor(2).await;
        executor
            .write(&INSERT_PAIR, &["a".into(), "b".into()])
            .await
            .expect("Failed to insert");

        let rows = executor
            .fetch_all(&SELECT_ALL, &[])
            .await
            .expect("Failed to list");

        let memos: Vec<_> = rows.iter().map(|r| r.get("memo").cloned()).collect();
        assert_eq!(
            memos,
            vec![
                Some(Value::Text("a".to_string())),
                Some(Value::Text("b".to_string()))
            ]
        );
    }

    #[tokio::test]
    async fn test_write_reports_rows_affected() {
        let executor = setup_executor(2).await;

        let written = executor
            .write(&INSERT_PAIR, &["a".into(), "b".into()])
            .await
            .expect("Failed to insert");

        assert_eq!(written, 2);
    }

    #[tokio::test]
    async fn test_failed_statement_rolls_back_whole_statement() {
        let executor = setup_executor(2).await;

        // Second row violates UNIQUE(memo); the first must not survive.
        let result = executor
            .write(&INSERT_PAIR, &["dup".into(), "dup".into()])
            .await;

        match result {
            Err(RepositoryError::QueryExecution {
                intent, constraint, ..
            }) => {
                assert_eq!(intent, "insert two ledger entries");
                assert_eq!(constraint, Some(ConstraintKind::Unique));
            }
            other => panic!("expected QueryExecution, got {other:#?}"),
        }
        assert_eq!(count(&executor).await, 0);
    }

    #[tokio::test]
    async fn test_not_null_violation_is_classified() {
        let executor = setup_executor(2).await;

        let result = executor
            .fetch_one(&INSERT, &[SqlValue::Null, SqlValue::Null, false.into()])
            .await;

        assert!(matches!(
            result,
            Err(RepositoryError::QueryExecution {
                constraint: Some(ConstraintKind::NotNull),
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_syntax_error_has_no_constraint() {
        let executor = setup_executor(2).await;
        let broken = Statement::new("run broken statement", "SELEC 1");

        let result = executor.write(&broken, &[]).await;

        assert!(matches!(
            result,
            Err(RepositoryError::QueryExecution {
                intent: "run broken statement",
                constraint: None,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_connection_released_after_failure() {
        // A single connection: if the failing call leaked it, the next call
        // would time out waiting for it.
        let executor = setup_executor(1).await;
        let broken = Statement::new("run broken statement", "SELEC 1");

        for _ in 0..3 {
            assert!(executor.write(&broken, &[]).await.is_err());
        }

        executor
            .write(&INSERT_PAIR, &["a".into(), "b".into()])
            .await
            .expect("connection should have been released");
        assert_eq!(count(&executor).await, 2);
    }

    #[tokio::test]
    async fn test_reads_do_not_leave_transaction_open() {
        let executor = setup_executor(1).await;

        executor
            .fetch_all(&SELECT_ALL, &[])
            .await
            .expect("Failed to list");
        executor
            .fetch_one(&SELECT_ONE, &[1_i64.into()])
            .await
            .expect("Failed to select");

        // BEGIN on a connection still inside a transaction would fail.
        executor
            .write(&INSERT_PAIR, &["a".into(), "b".into()])
            .await
            .expect("write after reads should succeed");
    }

    #[tokio::test]
    async fn test_closed_pool_reports_connection_unavailable() {
        let executor = setup_executor(2).await;
        executor.pool().shutdown().await;

        let result = executor.fetch_all(&SELECT_ALL, &[]).await;

        assert!(matches!(
            result,
            Err(RepositoryError::ConnectionUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_execute_mode_selects_output_shape() {
        let executor = setup_executor(2).await;

        let output = executor
            .execute(&SELECT_ALL, &[], FetchMode::FetchAll)
            .await
            .expect("Failed to list");

        assert_eq!(output, QueryOutput::All(vec![]));
    }
}
