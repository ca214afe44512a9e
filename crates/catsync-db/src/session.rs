//! Batched write session for one reconciliation pass.
//!
//! A `SyncSession` keeps one transaction open on the catalog connection and
//! commits it every `batch_size` records, starting a fresh one each time. A
//! crash between commits leaves the earlier batches persisted; reconciliation
//! is idempotent per record, so the next run picks up from there.
//!
//! In [`SessionMode::DryRun`] the whole pass stays in one transaction that
//! is rolled back by [`SyncSession::finish`].

use tracing::debug;

use crate::CatalogDb;
use crate::error::DatabaseError;

/// Whether a session's writes are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    Commit,
    DryRun,
}

pub struct SyncSession<'a> {
    catalog: &'a CatalogDb,
    tx: Option<libsql::Transaction>,
    mode: SessionMode,
    batch_size: usize,
    pending: usize,
    commits: usize,
}

impl CatalogDb {
    /// Begin a batched write session.
    ///
    /// No ledger writes may happen until the session is finished or aborted.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the transaction cannot be started.
    pub async fn begin_session(
        &self,
        mode: SessionMode,
        batch_size: usize,
    ) -> Result<SyncSession<'_>, DatabaseError> {
        let tx = self.conn().transaction().await?;
        Ok(SyncSession {
            catalog: self,
            tx: Some(tx),
            mode,
            batch_size: batch_size.max(1),
            pending: 0,
            commits: 0,
        })
    }
}

impl<'a> SyncSession<'a> {
    /// The catalog to write through. Writes land in the current batch.
    #[must_use]
    pub const fn catalog(&self) -> &'a CatalogDb {
        self.catalog
    }

    #[must_use]
    pub const fn mode(&self) -> SessionMode {
        self.mode
    }

    #[must_use]
    pub const fn is_dry_run(&self) -> bool {
        matches!(self.mode, SessionMode::DryRun)
    }

    /// Batches committed so far.
    #[must_use]
    pub const fn commits(&self) -> usize {
        self.commits
    }

    /// Mark one record as done. Commits and reopens the batch once
    /// `batch_size` records have accumulated. Never commits in a dry run.
    ///
    /// Returns whether a commit happened.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the commit or the next `BEGIN` fails.
    pub async fn checkpoint(&mut self) -> Result<bool, DatabaseError> {
        self.pending += 1;
        if self.is_dry_run() || self.pending < self.batch_size {
            return Ok(false);
        }
        self.commit_batch().await?;
        self.tx = Some(self.catalog.conn().transaction().await?);
        Ok(true)
    }

    /// Flush the final batch, or roll everything back in a dry run.
    ///
    /// Returns the total number of committed batches.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the final commit or rollback fails.
    pub async fn finish(mut self) -> Result<usize, DatabaseError> {
        if self.is_dry_run() {
            if let Some(tx) = self.tx.take() {
                tx.rollback().await?;
            }
            debug!(records = self.pending, "Dry run rolled back");
            return Ok(0);
        }
        self.commit_batch().await?;
        Ok(self.commits)
    }

    /// Roll back the open batch. Earlier committed batches stay.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the rollback fails.
    pub async fn abort(mut self) -> Result<(), DatabaseError> {
        if let Some(tx) = self.tx.take() {
            tx.rollback().await?;
            debug!(discarded = self.pending, "Rolled back open batch");
        }
        Ok(())
    }

    async fn commit_batch(&mut self) -> Result<(), DatabaseError> {
        if let Some(tx) = self.tx.take() {
            tx.commit().await?;
            self.commits += 1;
            debug!(batch = self.commits, records = self.pending, "Committed batch");
            self.pending = 0;
        }
        Ok(())
    }
}
