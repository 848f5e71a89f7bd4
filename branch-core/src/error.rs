//! Error types for branch-core

use thiserror::Error;

/// Main error type for the branch-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Database error (includes SQLite constraint violations)
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The storage location could not be opened
    #[error("failed to open storage at {location}: {source}")]
    Open {
        location: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Constraint violation reported by a non-SQLite backend
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// Stored schema cannot be used by this build
    #[error("schema error: {0}")]
    Schema(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// True for check, primary-key, not-null and foreign-key violations,
    /// whichever backend reported them.
    pub fn is_constraint_violation(&self) -> bool {
        match self {
            Error::Constraint(_) => true,
            Error::Database(rusqlite::Error::SqliteFailure(err, _)) => {
                err.code == rusqlite::ErrorCode::ConstraintViolation
            }
            _ => false,
        }
    }
}

/// Result type alias for branch-core
pub type Result<T> = std::result::Result<T, Error>;
