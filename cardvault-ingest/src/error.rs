//! Error types for cardvault-ingest
//!
//! Every variant except [`ImportError::TransientConflict`] is fatal for the
//! import that raised it. A transient conflict is retried once by
//! [`crate::utils::db_retry::retry_on_conflict`] before it is surfaced.

use thiserror::Error;

/// Import error type
#[derive(Debug, Error)]
pub enum ImportError {
    /// Malformed document shape or token stream
    #[error("Structural parse error at byte {offset}: {message}")]
    StructuralParse { offset: u64, message: String },

    /// A single record field could not be coerced
    #[error("Mapping error in {entity}: {message}")]
    Mapping { entity: String, message: String },

    /// A record failed its required-field checks
    #[error("Validation error in {entity}: {message}")]
    Validation { entity: String, message: String },

    /// Fewer faces arrived than the card names implied
    #[error("Incomplete multi-face cards at end of stream: {}", .0.join(", "))]
    Collation(Vec<String>),

    /// Post-reconciliation invariant violated
    #[error("Consistency error: {0}")]
    Consistency(String),

    /// Unique-constraint violation on a shared dictionary row
    #[error("Conflicting concurrent insert: {0}")]
    TransientConflict(sqlx::Error),

    /// Database error
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Import cancelled before completion
    #[error("Import cancelled")]
    Cancelled,

    /// Internal error (e.g. a reconciliation task panicked)
    #[error("Internal error: {0}")]
    Internal(String),

    /// cardvault-common error
    #[error("Common error: {0}")]
    Common(#[from] cardvault_common::Error),
}

impl From<sqlx::Error> for ImportError {
    /// Unique-constraint violations are classified as transient conflicts
    fn from(err: sqlx::Error) -> Self {
        let unique_violation = matches!(
            &err,
            sqlx::Error::Database(db_err) if db_err.is_unique_violation()
        );

        if unique_violation {
            ImportError::TransientConflict(err)
        } else {
            ImportError::Database(err)
        }
    }
}

impl ImportError {
    pub(crate) fn mapping(entity: impl Into<String>, message: impl Into<String>) -> Self {
        ImportError::Mapping {
            entity: entity.into(),
            message: message.into(),
        }
    }

    pub(crate) fn validation(entity: impl Into<String>, message: impl Into<String>) -> Self {
        ImportError::Validation {
            entity: entity.into(),
            message: message.into(),
        }
    }

    /// Whether this error is a recoverable duplicate-key race
    pub fn is_conflict(&self) -> bool {
        matches!(self, ImportError::TransientConflict(_))
    }

    /// Whether this error is SQLite writer contention ("database is locked")
    pub fn is_lock_contention(&self) -> bool {
        match self {
            ImportError::Database(db_err) => {
                let message = db_err.to_string();
                message.contains("database is locked") || message.contains("database is busy")
            }
            _ => false,
        }
    }
}

/// Result type for import operations
pub type ImportResult<T> = Result<T, ImportError>;
