use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// The pool was exhausted or closed, or the store could not be reached.
    #[error("Connection unavailable: {0}")]
    ConnectionUnavailable(String),

    /// The store rejected a statement. The call's transaction was rolled back.
    #[error("Query failed while trying to {intent}: {message}")]
    QueryExecution {
        intent: &'static str,
        message: String,
        constraint: Option<ConstraintKind>,
    },

    #[error(transparent)]
    DomainInvariantViolation(#[from] DomainViolation),

    #[error("Unexpected row shape: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl RepositoryError {
    /// Whether the store rejected the statement for breaking `kind`.
    pub fn is_constraint(
        &self,
        kind: ConstraintKind,
    ) -> bool {
        matches!(self, Self::QueryExecution { constraint: Some(c), .. } if *c == kind)
    }

    /// Whether this error means the client already has a tax return, whether
    /// it was caught as a domain rule or surfaced by the unique constraint.
    pub fn is_duplicate_tax_return(&self) -> bool {
        matches!(
            self,
            Self::DomainInvariantViolation(DomainViolation::DuplicateTaxReturn { .. })
        ) || self.is_constraint(ConstraintKind::Unique)
    }
}

/// Storage-level integrity constraint that rejected a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    Unique,
    ForeignKey,
    NotNull,
    Check,
}

/// A business rule rejected the operation before or independent of any write.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainViolation {
    #[error("Client {client_id} already has a tax return")]
    DuplicateTaxReturn { client_id: i64 },

    #[error("'{field}' is not an updatable {entity} field")]
    UnknownField { entity: &'static str, field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidValue {
        field: &'static str,
        value: String,
        reason: String,
    },
}
