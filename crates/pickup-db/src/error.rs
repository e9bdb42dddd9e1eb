//! # Database Error Types
//!
//! Error types for storage gateway operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  PostgreSQL Error (sqlx::Error, SQLSTATE)                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← Classified by SQLSTATE class                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CoreError (orchestrator) ← Detail logged, opaque to callers           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;
use uuid::Uuid;

/// SQLSTATE: unique_violation
const UNIQUE_VIOLATION: &str = "23505";
/// SQLSTATE: foreign_key_violation
const FOREIGN_KEY_VIOLATION: &str = "23503";
/// SQLSTATE: serialization_failure
const SERIALIZATION_FAILURE: &str = "40001";
/// SQLSTATE: deadlock_detected
const DEADLOCK_DETECTED: &str = "40P01";

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// No point row with the given id.
    #[error("Point not found: {0}")]
    PointNotFound(Uuid),

    /// The reception has no products left to delete.
    #[error("No product to delete in reception {0}")]
    NoProductToDelete(Uuid),

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - A second in-progress reception for the same point slipped past
    ///   the check and hit `uq_receptions_one_active_per_point`
    #[error("Unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    /// Foreign key constraint violation.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Concurrent transaction conflict (serialization failure or deadlock).
    ///
    /// The whole transaction may be retried.
    #[error("Serialization failure: {0}")]
    SerializationFailure(String),

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Transaction could not be started or committed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// True when the store itself could not be reached.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, DbError::ConnectionFailed(_) | DbError::PoolExhausted)
    }

    /// True when retrying the whole transaction may succeed.
    pub fn is_serialization_conflict(&self) -> bool {
        matches!(self, DbError::SerializationFailure(_))
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::Database 23505       → DbError::UniqueViolation
/// sqlx::Error::Database 23503       → DbError::ForeignKeyViolation
/// sqlx::Error::Database 40001/40P01 → DbError::SerializationFailure
/// sqlx::Error::Io / Tls             → DbError::ConnectionFailed
/// sqlx::Error::PoolTimedOut         → DbError::PoolExhausted
/// Other                             → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let message = db_err.message().to_string();
                match db_err.code().as_deref() {
                    Some(UNIQUE_VIOLATION) => DbError::UniqueViolation {
                        constraint: db_err
                            .constraint()
                            .unwrap_or("unknown")
                            .to_string(),
                    },
                    Some(FOREIGN_KEY_VIOLATION) => DbError::ForeignKeyViolation { message },
                    Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED) => {
                        DbError::SerializationFailure(message)
                    }
                    _ => DbError::QueryFailed(message),
                }
            }

            sqlx::Error::Io(e) => DbError::ConnectionFailed(e.to_string()),

            sqlx::Error::Tls(e) => DbError::ConnectionFailed(e.to_string()),

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_errors_are_unavailable() {
        assert!(DbError::from(sqlx::Error::PoolTimedOut).is_unavailable());
        assert!(DbError::from(sqlx::Error::PoolClosed).is_unavailable());
        assert!(!DbError::QueryFailed("syntax".into()).is_unavailable());
    }

    #[test]
    fn test_row_not_found_is_internal() {
        let err = DbError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, DbError::Internal(_)));
    }

    #[test]
    fn test_serialization_conflict_predicate() {
        assert!(DbError::SerializationFailure("40001".into()).is_serialization_conflict());
        assert!(!DbError::PoolExhausted.is_serialization_conflict());
    }
}
