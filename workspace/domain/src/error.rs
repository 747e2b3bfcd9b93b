use sea_orm::DbErr;
use thiserror::Error;

/// Error types for the domain rules
#[derive(Error, Debug)]
pub enum DomainError {
    /// Error from the database operations
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// A request broke a field rule or referenced a missing record
    #[error("{0}")]
    Validation(String),

    /// A request clashes with existing state (overlapping lease, duplicate email, ...)
    #[error("{0}")]
    Conflict(String),

    /// The addressed record does not exist
    #[error("{0} not found")]
    NotFound(String),
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        DomainError::Validation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        DomainError::Conflict(message.into())
    }
}

/// Type alias for Result with DomainError
pub type Result<T> = std::result::Result<T, DomainError>;
