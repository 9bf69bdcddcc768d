//! SQLite storage for the accounting office: connection pooling, a
//! transactional query executor, schema setup, and per-table repositories.

pub mod executor;
pub mod pool;
pub mod repository;
pub mod row;
pub mod schema;

pub use executor::{FetchMode, QueryExecutor, QueryOutput, Statement};
pub use pool::ConnectionPool;
pub use repository::{
    AssistantRepository, ClientRepository, NamedRepository, PreparerRepository,
    SqliteRepository, TaxReturnRepository,
};
pub use row::{Row, SqlValue, Value};
pub use schema::create_schema;
