//! Database error types for catsync-db.

use catsync_core::errors::CoreError;
use thiserror::Error;

/// Errors from catalog store operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A SQL query failed or returned data that could not be parsed.
    #[error("Query failed: {0}")]
    Query(String),

    /// Schema migration failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Expected a result row but none was returned.
    #[error("No result returned")]
    NoResult,

    /// Invalid state encountered, such as a concurrent run of the same type.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A core rule was violated (ledger transition, unknown stored enum).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),
}
