//! End-to-end orchestration of one sync run.
//!
//! Order of operations:
//!
//! 1. Fingerprint the sources; with `if_changed`, stop if none changed.
//! 2. Decode and merge the extracts. Structural errors end the run here,
//!    before anything is written.
//! 3. Heal orphaned `IN_PROGRESS` rows, then open a new ledger row.
//! 4. Reconcile content and activity inside a batched session.
//! 5. Close the ledger row as `SUCCESS` or `FAILED`.
//! 6. Record source fingerprints and write the change report. Failures in
//!    either are logged, not raised, so they never contradict the ledger.
//!
//! A dry run skips every ledger and fingerprint write and rolls the session
//! back, so only the report and the returned summary remain.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use catsync_config::CatsyncConfig;
use catsync_core::changes::ChangeSet;
use catsync_core::entities::SyncCounters;
use catsync_core::enums::ChangeKind;
use catsync_db::{CatalogDb, SessionMode, SyncSession};
use catsync_dbf::{ColumnMapping, SourceRecord};

use crate::activity::apply_activity;
use crate::error::SyncError;
use crate::fingerprint::{all_unchanged, fingerprint_file};
use crate::reconcile::{CatalogSnapshot, Reconciler, SkipCounts};
use crate::report::{ChangeReportWriter, ReportContext, ReportPaths};
use crate::source::{SourceStats, column_mapping, load_sources};

/// Sources and switches for one run.
#[derive(Debug, Clone, Default)]
pub struct SyncRequest {
    pub primary: PathBuf,
    pub supplementary: Option<PathBuf>,
    pub dry_run: bool,
    pub if_changed: bool,
}

impl SyncRequest {
    fn paths(&self) -> Vec<&Path> {
        std::iter::once(self.primary.as_path())
            .chain(self.supplementary.as_deref())
            .collect()
    }

    fn source_label(&self) -> String {
        self.paths()
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(" + ")
    }
}

/// How a run ended, when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Success,
    DryRun,
    /// Skipped because no source changed since the last successful run.
    Unchanged,
}

impl RunOutcome {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::DryRun => "dry_run",
            Self::Unchanged => "unchanged",
        }
    }
}

/// What a run did, for display and scripting.
#[derive(Debug, Clone, Serialize)]
pub struct SyncSummary {
    pub run_id: Option<i64>,
    pub outcome: RunOutcome,
    pub source: String,
    pub counters: SyncCounters,
    pub skips: SkipCounts,
    pub changes: BTreeMap<ChangeKind, usize>,
    pub field_errors: i64,
    pub batches: usize,
    pub healed_runs: Vec<i64>,
    pub sources: Option<SourceStats>,
    pub report: Option<ReportPaths>,
}

impl SyncSummary {
    fn unchanged(source: String) -> Self {
        Self {
            run_id: None,
            outcome: RunOutcome::Unchanged,
            source,
            counters: SyncCounters::default(),
            skips: SkipCounts::default(),
            changes: BTreeMap::new(),
            field_errors: 0,
            batches: 0,
            healed_runs: Vec::new(),
            sources: None,
            report: None,
        }
    }

    /// Total change events across kinds.
    #[must_use]
    pub fn total_changes(&self) -> usize {
        self.changes.values().sum()
    }
}

/// Everything a reconciliation pass produced before the ledger is closed.
struct PassResult {
    counters: SyncCounters,
    skips: SkipCounts,
    changes: ChangeSet,
    field_errors: i64,
    batches: usize,
}

/// Runs sync passes against one catalog.
pub struct SyncRunner<'a> {
    db: &'a CatalogDb,
    mapping: ColumnMapping,
    sync_type: String,
    batch_size: usize,
    tolerance: f64,
    report_dir: PathBuf,
}

impl<'a> SyncRunner<'a> {
    #[must_use]
    pub fn new(db: &'a CatalogDb, config: &CatsyncConfig) -> Self {
        Self {
            db,
            mapping: column_mapping(&config.source),
            sync_type: config.sync.sync_type.clone(),
            batch_size: config.sync.batch_size,
            tolerance: config.sync.price_tolerance,
            report_dir: PathBuf::from(&config.sync.report_dir),
        }
    }

    /// Execute one run.
    ///
    /// # Errors
    ///
    /// Returns `SyncError` for a missing or malformed source (nothing
    /// written), or for a store failure during the pass (ledger row marked
    /// `FAILED` before the error is returned).
    pub async fn run(&self, request: &SyncRequest) -> Result<SyncSummary, SyncError> {
        let now = Utc::now();
        let source = request.source_label();

        let fingerprints = request
            .paths()
            .into_iter()
            .map(|path| fingerprint_file(&self.sync_type, path, now))
            .collect::<Result<Vec<_>, _>>()?;
        if request.if_changed && all_unchanged(self.db, &fingerprints).await? {
            info!(%source, "Sources unchanged since last successful sync, skipping");
            return Ok(SyncSummary::unchanged(source));
        }

        let (records, source_stats) = load_sources(
            &request.primary,
            request.supplementary.as_deref(),
            &self.mapping,
        )?;

        let (healed_runs, run) = if request.dry_run {
            (Vec::new(), None)
        } else {
            let healed = self.db.heal_interrupted_runs(&self.sync_type).await?;
            let run = self.db.open_run(&self.sync_type, &source).await?;
            info!(run_id = run.id, sync_type = %self.sync_type, %source, "Started sync run");
            (healed.into_iter().map(|r| r.id).collect(), Some(run))
        };

        let mode = if request.dry_run {
            SessionMode::DryRun
        } else {
            SessionMode::Commit
        };
        let pass = match self.execute(&records, mode, now).await {
            Ok(pass) => pass,
            Err(e) => {
                if let Some(run) = &run {
                    self.record_failure(run.id, &e).await;
                }
                return Err(e);
            }
        };

        if let Some(run) = &run {
            if let Err(e) = self.db.complete_run(run.id, pass.counters).await {
                let e = SyncError::from(e);
                self.record_failure(run.id, &e).await;
                return Err(e);
            }
            for fingerprint in &fingerprints {
                if let Err(e) = self.db.record_fingerprint(fingerprint).await {
                    warn!(
                        path = %fingerprint.source_path,
                        error = %e,
                        "Failed to record source fingerprint"
                    );
                }
            }
            info!(
                run_id = run.id,
                processed = pass.counters.processed,
                added = pass.counters.added,
                updated = pass.counters.updated,
                skipped = pass.counters.skipped,
                activated = pass.counters.activated,
                deactivated = pass.counters.deactivated,
                "Sync run completed"
            );
        }

        let run_id = run.as_ref().map(|r| r.id);
        let report = self.write_report(&pass, &request.paths(), run_id, request.dry_run, now);

        Ok(SyncSummary {
            run_id,
            outcome: if request.dry_run {
                RunOutcome::DryRun
            } else {
                RunOutcome::Success
            },
            source,
            counters: pass.counters,
            skips: pass.skips,
            changes: ChangeKind::ALL
                .into_iter()
                .map(|kind| (kind, pass.changes.count(kind)))
                .collect(),
            field_errors: pass.field_errors,
            batches: pass.batches,
            healed_runs,
            sources: Some(source_stats),
            report,
        })
    }

    /// Snapshot, reconcile and diff activity inside one session.
    ///
    /// The open batch is rolled back on any error; earlier batches stay.
    async fn execute(
        &self,
        records: &[SourceRecord],
        mode: SessionMode,
        now: DateTime<Utc>,
    ) -> Result<PassResult, SyncError> {
        let mut snapshot = CatalogSnapshot::load(self.db).await?;
        let mut session = self.db.begin_session(mode, self.batch_size).await?;

        match self.apply(&mut session, &mut snapshot, records, now).await {
            Ok(mut pass) => {
                pass.batches = session.finish().await?;
                Ok(pass)
            }
            Err(e) => {
                if let Err(rollback) = session.abort().await {
                    warn!(error = %rollback, "Failed to roll back open batch");
                }
                Err(e)
            }
        }
    }

    async fn apply(
        &self,
        session: &mut SyncSession<'_>,
        snapshot: &mut CatalogSnapshot,
        records: &[SourceRecord],
        now: DateTime<Utc>,
    ) -> Result<PassResult, SyncError> {
        let outcome = Reconciler::at(self.tolerance, now)
            .reconcile(session, snapshot, records)
            .await?;
        let (_, activity) = apply_activity(session, &outcome.seen, &outcome.present, now).await?;

        let mut counters = outcome.counters;
        counters.activated = activity.activated;
        counters.deactivated = activity.deactivated;

        Ok(PassResult {
            counters,
            skips: outcome.skips,
            changes: outcome.changes,
            field_errors: outcome.field_errors,
            batches: 0,
        })
    }

    async fn record_failure(&self, run_id: i64, error: &SyncError) {
        warn!(run_id, error = %error, "Sync run failed");
        if let Err(ledger) = self.db.fail_run(run_id, &error.to_string()).await {
            warn!(run_id, error = %ledger, "Could not mark sync run as failed");
        }
    }

    fn write_report(
        &self,
        pass: &PassResult,
        sources: &[&Path],
        run_id: Option<i64>,
        dry_run: bool,
        now: DateTime<Utc>,
    ) -> Option<ReportPaths> {
        let context = ReportContext {
            generated_at: now,
            sources: sources.iter().map(|p| p.display().to_string()).collect(),
            run_id,
            dry_run,
            counters: pass.counters,
        };
        match ChangeReportWriter::new(&self.report_dir).write(&pass.changes, &context) {
            Ok(paths) => {
                info!(path = %paths.text.display(), changes = pass.changes.len(), "Wrote change report");
                Some(paths)
            }
            Err(e) => {
                warn!(dir = %self.report_dir.display(), error = %e, "Failed to write change report");
                None
            }
        }
    }
}
