pub mod db;
pub mod models;

pub use db::config::{DbConfig, PoolConfig};
pub use db::error::{ConstraintKind, DomainViolation, RepositoryError};
pub use db::repository::AccountingRepository;
pub use models::*;
