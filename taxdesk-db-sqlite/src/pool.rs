use std::str::FromStr;
use std::time::Duration;

use sqlx::Sqlite;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use taxdesk_core::{DbConfig, RepositoryError};
use tracing::{debug, info};

/// How long a connection waits on a locked database before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Bounded set of live SQLite connections shared by every caller.
///
/// This is a handle: clones share the same underlying pool. Build one at
/// startup with [`ConnectionPool::connect`] and hand clones to the
/// [`QueryExecutor`](crate::executor::QueryExecutor).
#[derive(Debug, Clone)]
pub struct ConnectionPool {
    pool: SqlitePool,
}

impl ConnectionPool {
    /// Validate the pool bounds and open at least `min_connections`
    /// connections to `config.connection_string`.
    ///
    /// Accepted connection strings:
    /// * A bare file path, e.g. `"taxdesk.db"`. Created if missing.
    /// * A sqlx URL, e.g. `"sqlite:taxdesk.db"`.
    /// * `":memory:"` or `"sqlite::memory:"`, an in-memory database shared by
    ///   every connection of this pool.
    pub async fn connect(config: &DbConfig) -> Result<Self, RepositoryError> {
        config.pool.validate()?;

        let options = SqliteConnectOptions::from_str(&config.connection_string)
            .map_err(|e| {
                RepositoryError::Configuration(format!(
                    "Invalid connection string '{}': {e}",
                    config.connection_string
                ))
            })?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .min_connections(config.pool.min_connections)
            .max_connections(config.pool.max_connections)
            .acquire_timeout(config.pool.acquire_timeout)
            .connect_with(options)
            .await
            .map_err(|e| {
                RepositoryError::ConnectionUnavailable(format!(
                    "Failed to connect to database '{}': {e}",
                    config.connection_string
                ))
            })?;

        debug!(
            min = config.pool.min_connections,
            max = config.pool.max_connections,
            "connection pool ready"
        );
        Ok(Self { pool })
    }

    /// Borrow a connection, waiting up to the configured acquire timeout.
    ///
    /// Every successful call must be paired with [`ConnectionPool::release`];
    /// a connection that is dropped instead is returned to the pool as well.
    pub(crate) async fn acquire(&self) -> Result<PoolConnection<Sqlite>, RepositoryError> {
        self.pool
            .acquire()
            .await
            .map_err(|e| RepositoryError::ConnectionUnavailable(e.to_string()))
    }

    /// Hand a connection back for reuse. Taking it by value means it can't be
    /// released twice.
    pub(crate) fn release(
        &self,
        conn: PoolConnection<Sqlite>,
    ) {
        drop(conn);
    }

    /// Close every connection. Later acquisitions fail with
    /// [`RepositoryError::ConnectionUnavailable`].
    pub async fn shutdown(&self) {
        self.pool.close().await;
        info!("connection pool closed");
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    /// Connections currently open, idle or lent out.
    pub fn size(&self) -> u32 {
        self.pool.size()
    }
}
