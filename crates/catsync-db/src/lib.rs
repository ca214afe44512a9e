//! # catsync-db
//!
//! libSQL catalog store for catsync.
//!
//! Holds the persisted catalog (products, append-only price history, barcodes),
//! the sync ledger, and source fingerprints. Repository methods are
//! implemented as `impl CatalogDb` blocks under [`repos`]. Reconciliation
//! writes go through a [`session::SyncSession`], which batches them into
//! bounded transactions.
//!
//! Uses the `libsql` crate (C `SQLite` fork) in local mode.

pub mod error;
pub mod helpers;
mod migrations;
pub mod repos;
pub mod session;

#[cfg(test)]
mod test_support;

use error::DatabaseError;
use libsql::Builder;

pub use repos::prices::NewPrice;
pub use repos::sync_log::HEALED_RUN_MESSAGE;
pub use session::{SessionMode, SyncSession};

/// Central database handle for catalog state.
///
/// Wraps a libSQL database and a single connection. `SQLite` transactions are
/// per-connection, so every write made while a [`SyncSession`] is open is
/// part of that session's current batch.
pub struct CatalogDb {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
}

impl CatalogDb {
    /// Open a local database at the given path, or `":memory:"` for tests.
    ///
    /// Runs migrations on every open.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or
    /// migrations fail.
    pub async fn open_local(path: &str) -> Result<Self, DatabaseError> {
        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;

        // Enable foreign keys (must be per-connection in SQLite)
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| DatabaseError::Migration(format!("PRAGMA foreign_keys: {e}")))?;

        let catalog = Self { db, conn };
        catalog.run_migrations().await?;
        Ok(catalog)
    }

    /// Access the underlying libSQL connection for direct queries.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }
}
