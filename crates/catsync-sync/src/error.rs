//! Sync engine error types.

use catsync_db::error::DatabaseError;
use catsync_dbf::DbfError;
use thiserror::Error;

/// Fatal errors that abort a sync run.
///
/// Record-level problems (unparsable fields, skipped records, a truncated
/// tail) are absorbed and counted instead.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The source extract is structurally unreadable.
    #[error(transparent)]
    Source(#[from] DbfError),

    /// A catalog read, write or commit failed.
    #[error(transparent)]
    Database(#[from] DatabaseError),

    /// A configured source path does not exist.
    #[error("Source extract not found: {0}")]
    SourceMissing(String),

    /// Filesystem error outside the extract reader (fingerprinting, reports).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
