pub mod config;
pub mod error;
pub mod repository;

pub use config::{DbConfig, PoolConfig};
pub use error::{ConstraintKind, DomainViolation, RepositoryError};
pub use repository::AccountingRepository;
