use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::RepositoryError;

/// Smallest pool a [`PoolConfig`] may describe.
pub const MIN_POOL_SIZE: u32 = 1;
/// Largest pool a [`PoolConfig`] may describe.
pub const MAX_POOL_SIZE: u32 = 10;

const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection configuration supplied once at process start.
///
/// | connection_string examples                          |
/// |-----------------------------------------------------|
/// | `taxdesk.db`, `sqlite:taxdesk.db`, `sqlite::memory:` |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbConfig {
    /// File path or sqlx-style SQLite URL, passed to the store unchanged.
    pub connection_string: String,
    #[serde(default)]
    pub pool: PoolConfig,
}

impl DbConfig {
    pub fn new(connection_string: impl Into<String>) -> Self {
        Self {
            connection_string: connection_string.into(),
            pool: PoolConfig::default(),
        }
    }

    pub fn with_pool(
        mut self,
        pool: PoolConfig,
    ) -> Self {
        self.pool = pool;
        self
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self::new("sqlite::memory:")
    }
}

/// Bounds and exhaustion policy for the connection pool.
///
/// When every connection is lent out, `acquire` waits up to
/// `acquire_timeout` for one to come back and then fails with
/// [`RepositoryError::ConnectionUnavailable`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub min_connections: u32,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl PoolConfig {
    /// Check `1 <= min_connections <= max_connections <= 10`.
    pub fn validate(&self) -> Result<(), RepositoryError> {
        if self.min_connections < MIN_POOL_SIZE {
            return Err(RepositoryError::Configuration(format!(
                "min_connections must be at least {MIN_POOL_SIZE}, got {}",
                self.min_connections
            )));
        }
        if self.max_connections > MAX_POOL_SIZE {
            return Err(RepositoryError::Configuration(format!(
                "max_connections must be at most {MAX_POOL_SIZE}, got {}",
                self.max_connections
            )));
        }
        if self.min_connections > self.max_connections {
            return Err(RepositoryError::Configuration(format!(
                "min_connections ({}) exceeds max_connections ({})",
                self.min_connections, self.max_connections
            )));
        }
        Ok(())
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_connections: MIN_POOL_SIZE,
            max_connections: MAX_POOL_SIZE,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
        }
    }
}
