//! Sync ledger.
//!
//! Manages the run lifecycle: heal, open, complete, fail. Transitions are
//! validated against `SyncStatus::allowed_next_states()` before any write.
//!
//! Ledger writes are autocommitted. Callers must not hold an open
//! [`crate::SyncSession`] batch while writing here, or the ledger row would
//! share that batch's fate.

use chrono::Utc;
use tracing::warn;

use catsync_core::entities::{SyncCounters, SyncRun};
use catsync_core::enums::SyncStatus;
use catsync_core::errors::CoreError;

use crate::CatalogDb;
use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_datetime, parse_enum, parse_optional_datetime};

/// Error text written on runs healed from `IN_PROGRESS`.
pub const HEALED_RUN_MESSAGE: &str = "Interrupted by crash before completion";

const RUN_COLUMNS: &str = "id, sync_type, source_file, status, records_processed, records_added, \
     records_updated, records_skipped, products_activated, products_deactivated, error_message, \
     started_at, completed_at";

impl CatalogDb {
    /// Fail every run of `sync_type` still marked `IN_PROGRESS`.
    ///
    /// Such rows can only be left behind by a process that died mid-run.
    /// Returns the healed runs.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query or update fails.
    pub async fn heal_interrupted_runs(&self, sync_type: &str) -> Result<Vec<SyncRun>, DatabaseError> {
        let orphans = self.runs_in_status(sync_type, SyncStatus::InProgress).await?;
        let mut healed = Vec::with_capacity(orphans.len());
        for orphan in orphans {
            warn!(
                run_id = orphan.id,
                sync_type,
                started_at = %orphan.started_at,
                "Healing sync run left in progress"
            );
            healed.push(self.fail_run(orphan.id, HEALED_RUN_MESSAGE).await?);
        }
        Ok(healed)
    }

    /// Open a new `IN_PROGRESS` run.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::InvalidState` if another run of the same type is
    /// already in progress, or `DatabaseError` if the insert fails.
    pub async fn open_run(&self, sync_type: &str, source_file: &str) -> Result<SyncRun, DatabaseError> {
        let now = Utc::now();
        let result = self
            .conn()
            .execute(
                "INSERT INTO sync_log (sync_type, source_file, status, started_at) VALUES (?1, ?2, ?3, ?4)",
                libsql::params![
                    sync_type,
                    source_file,
                    SyncStatus::InProgress.as_str(),
                    now.to_rfc3339()
                ],
            )
            .await;

        match result {
            Ok(_) => {}
            Err(e) if e.to_string().contains("UNIQUE constraint failed") => {
                return Err(DatabaseError::InvalidState(format!(
                    "a {sync_type} run is already in progress"
                )));
            }
            Err(e) => return Err(e.into()),
        }

        Ok(SyncRun {
            id: self.conn().last_insert_rowid(),
            sync_type: sync_type.to_string(),
            source_file: source_file.to_string(),
            status: SyncStatus::InProgress,
            counters: SyncCounters::default(),
            error_message: None,
            started_at: now,
            completed_at: None,
        })
    }

    /// Transition a run to `SUCCESS`, recording its counters.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::InvalidState` if the run is not `IN_PROGRESS`.
    pub async fn complete_run(&self, id: i64, counters: SyncCounters) -> Result<SyncRun, DatabaseError> {
        let current = self.get_run(id).await?;
        ensure_transition(&current, SyncStatus::Success)?;

        let now = Utc::now();
        self.conn()
            .execute(
                "UPDATE sync_log
                 SET status = ?1, records_processed = ?2, records_added = ?3, records_updated = ?4,
                     records_skipped = ?5, products_activated = ?6, products_deactivated = ?7,
                     completed_at = ?8
                 WHERE id = ?9",
                libsql::params![
                    SyncStatus::Success.as_str(),
                    counters.processed,
                    counters.added,
                    counters.updated,
                    counters.skipped,
                    counters.activated,
                    counters.deactivated,
                    now.to_rfc3339(),
                    id
                ],
            )
            .await?;

        Ok(SyncRun {
            status: SyncStatus::Success,
            counters,
            completed_at: Some(now),
            ..current
        })
    }

    /// Transition a run to `FAILED`, recording the error text.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::InvalidState` if the run is not `IN_PROGRESS`.
    pub async fn fail_run(&self, id: i64, message: &str) -> Result<SyncRun, DatabaseError> {
        let current = self.get_run(id).await?;
        ensure_transition(&current, SyncStatus::Failed)?;

        let now = Utc::now();
        self.conn()
            .execute(
                "UPDATE sync_log SET status = ?1, error_message = ?2, completed_at = ?3 WHERE id = ?4",
                libsql::params![SyncStatus::Failed.as_str(), message, now.to_rfc3339(), id],
            )
            .await?;

        Ok(SyncRun {
            status: SyncStatus::Failed,
            error_message: Some(message.to_string()),
            completed_at: Some(now),
            ..current
        })
    }

    /// Get a run by id.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if the run does not exist.
    pub async fn get_run(&self, id: i64) -> Result<SyncRun, DatabaseError> {
        let sql = format!("SELECT {RUN_COLUMNS} FROM sync_log WHERE id = ?1");
        let mut rows = self.conn().query(&sql, [id]).await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        row_to_run(&row)
    }

    /// Most recent runs across all sync types, newest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn recent_runs(&self, limit: u32) -> Result<Vec<SyncRun>, DatabaseError> {
        let sql = format!("SELECT {RUN_COLUMNS} FROM sync_log ORDER BY id DESC LIMIT ?1");
        let mut rows = self.conn().query(&sql, [i64::from(limit)]).await?;
        let mut runs = Vec::new();
        while let Some(row) = rows.next().await? {
            runs.push(row_to_run(&row)?);
        }
        Ok(runs)
    }

    async fn runs_in_status(&self, sync_type: &str, status: SyncStatus) -> Result<Vec<SyncRun>, DatabaseError> {
        let sql = format!("SELECT {RUN_COLUMNS} FROM sync_log WHERE sync_type = ?1 AND status = ?2 ORDER BY id");
        let mut rows = self
            .conn()
            .query(&sql, libsql::params![sync_type, status.as_str()])
            .await?;
        let mut runs = Vec::new();
        while let Some(row) = rows.next().await? {
            runs.push(row_to_run(&row)?);
        }
        Ok(runs)
    }
}

fn ensure_transition(run: &SyncRun, next: SyncStatus) -> Result<(), DatabaseError> {
    if run.status.can_transition_to(next) {
        Ok(())
    } else {
        Err(CoreError::InvalidTransition {
            entity_type: "sync run".to_string(),
            id: run.id.to_string(),
            from: run.status.to_string(),
            to: next.to_string(),
        }
        .into())
    }
}

/// Convert a libSQL row to a `SyncRun`.
fn row_to_run(row: &libsql::Row) -> Result<SyncRun, DatabaseError> {
    Ok(SyncRun {
        id: row.get::<i64>(0)?,
        sync_type: row.get::<String>(1)?,
        source_file: row.get::<String>(2)?,
        status: parse_enum(&row.get::<String>(3)?)?,
        counters: SyncCounters {
            processed: row.get::<i64>(4)?,
            added: row.get::<i64>(5)?,
            updated: row.get::<i64>(6)?,
            skipped: row.get::<i64>(7)?,
            activated: row.get::<i64>(8)?,
            deactivated: row.get::<i64>(9)?,
        },
        error_message: get_opt_string(row, 10)?,
        started_at: parse_datetime(&row.get::<String>(11)?)?,
        completed_at: parse_optional_datetime(get_opt_string(row, 12)?.as_deref())?,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::test_support::test_db;

    const SYNC_TYPE: &str = "CATALOG_SYNC";

    #[tokio::test]
    async fn run_lifecycle_success() {
        let db = test_db().await;
        let run = db.open_run(SYNC_TYPE, "MP_MER.FPB").await.unwrap();
        assert_eq!(run.status, SyncStatus::InProgress);

        let counters = SyncCounters {
            processed: 10,
            added: 2,
            updated: 3,
            skipped: 1,
            activated: 1,
            deactivated: 4,
        };
        let done = db.complete_run(run.id, counters).await.unwrap();
        assert_eq!(done.status, SyncStatus::Success);

        let stored = db.get_run(run.id).await.unwrap();
        assert_eq!(stored.status, SyncStatus::Success);
        assert_eq!(stored.counters, counters);
        assert!(stored.completed_at.is_some());
        assert_eq!(stored.error_message, None);
    }

    #[tokio::test]
    async fn failed_run_keeps_error_text() {
        let db = test_db().await;
        let run = db.open_run(SYNC_TYPE, "MP_MER.FPB").await.unwrap();
        db.fail_run(run.id, "disk full").await.unwrap();

        let stored = db.get_run(run.id).await.unwrap();
        assert_eq!(stored.status, SyncStatus::Failed);
        assert_eq!(stored.error_message.as_deref(), Some("disk full"));
    }

    #[tokio::test]
    async fn terminal_runs_cannot_transition() {
        let db = test_db().await;
        let run = db.open_run(SYNC_TYPE, "MP_MER.FPB").await.unwrap();
        db.complete_run(run.id, SyncCounters::default()).await.unwrap();

        let err = db.fail_run(run.id, "late").await.unwrap_err();
        assert!(
            matches!(err, DatabaseError::Core(CoreError::InvalidTransition { .. })),
            "got {err:?}"
        );
        let err = db.complete_run(run.id, SyncCounters::default()).await.unwrap_err();
        assert!(err.to_string().contains("from SUCCESS to SUCCESS"), "got {err}");
    }

    #[tokio::test]
    async fn second_open_run_of_same_type_is_rejected() {
        let db = test_db().await;
        db.open_run(SYNC_TYPE, "a").await.unwrap();

        let err = db.open_run(SYNC_TYPE, "b").await.unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidState(_)), "got {err:?}");

        // A different sync type is independent.
        db.open_run("PRICE_ONLY", "c").await.unwrap();
    }

    #[tokio::test]
    async fn heal_fails_orphaned_runs_of_that_type_only() {
        let db = test_db().await;
        let orphan = db.open_run(SYNC_TYPE, "MP_MER.FPB").await.unwrap();
        let other = db.open_run("PRICE_ONLY", "x").await.unwrap();

        let healed = db.heal_interrupted_runs(SYNC_TYPE).await.unwrap();
        assert_eq!(healed.len(), 1);
        assert_eq!(healed[0].id, orphan.id);

        let stored = db.get_run(orphan.id).await.unwrap();
        assert_eq!(stored.status, SyncStatus::Failed);
        assert_eq!(stored.error_message.as_deref(), Some(HEALED_RUN_MESSAGE));
        assert_eq!(db.get_run(other.id).await.unwrap().status, SyncStatus::InProgress);

        // The type is free again.
        db.open_run(SYNC_TYPE, "MP_MER.FPB").await.unwrap();
        assert!(db.heal_interrupted_runs("NOTHING").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn recent_runs_newest_first() {
        let db = test_db().await;
        for source in ["one", "two", "three"] {
            let run = db.open_run(SYNC_TYPE, source).await.unwrap();
            db.complete_run(run.id, SyncCounters::default()).await.unwrap();
        }

        let sources: Vec<String> = db
            .recent_runs(2)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.source_file)
            .collect();
        assert_eq!(sources, vec!["three".to_string(), "two".to_string()]);
    }
}
