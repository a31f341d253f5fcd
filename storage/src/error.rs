//! Storage error types.
//!
//! Used by the connection manager, repository implementations and callers of storage APIs.

use sqlx::error::ErrorKind;
use thiserror::Error;

/// Errors that can occur when using storage operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Statement error: {0}")]
    Statement(String),
    #[error("Constraint violation: {0}")]
    Constraint(String),
    #[error("Invalid message: {0}")]
    InvalidMessage(String),
}

impl StorageError {
    /// Maps a driver error raised while opening the handle.
    pub(crate) fn connection(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(e) => StorageError::Configuration(e.to_string()),
            other => StorageError::Connection(other.to_string()),
        }
    }
}

/// Errors raised by a statement on an established handle.
impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err)
                if matches!(
                    db_err.kind(),
                    ErrorKind::UniqueViolation
                        | ErrorKind::ForeignKeyViolation
                        | ErrorKind::NotNullViolation
                        | ErrorKind::CheckViolation
                ) =>
            {
                StorageError::Constraint(db_err.message().to_string())
            }
            _ => StorageError::Statement(err.to_string()),
        }
    }
}
