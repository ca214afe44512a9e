use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;

use catsync_config::CatsyncConfig;
use catsync_core::entities::{CatalogStats, SyncRun};
use catsync_core::enums::SyncStatus;
use catsync_db::CatalogDb;

use crate::cli::root_commands::StatusArgs;
use crate::cli::{GlobalFlags, OutputFormat};
use crate::output::output;

#[derive(Debug, Serialize)]
struct StatusResponse {
    database: String,
    catalog: CatalogStats,
    runs: Vec<RunRow>,
}

/// One ledger row, flattened for display.
#[derive(Debug, Serialize)]
struct RunRow {
    id: i64,
    sync_type: String,
    status: SyncStatus,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    processed: i64,
    added: i64,
    updated: i64,
    skipped: i64,
    activated: i64,
    deactivated: i64,
    error: Option<String>,
}

impl From<SyncRun> for RunRow {
    fn from(run: SyncRun) -> Self {
        Self {
            id: run.id,
            sync_type: run.sync_type,
            status: run.status,
            started_at: run.started_at,
            completed_at: run.completed_at,
            processed: run.counters.processed,
            added: run.counters.added,
            updated: run.counters.updated,
            skipped: run.counters.skipped,
            activated: run.counters.activated,
            deactivated: run.counters.deactivated,
            error: run.error_message,
        }
    }
}

/// Handle `catsync status`.
pub async fn handle(args: &StatusArgs, config: &CatsyncConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    let db = CatalogDb::open_local(&config.database.path)
        .await
        .with_context(|| format!("failed to open catalog at {}", config.database.path))?;

    let response = StatusResponse {
        database: config.database.path.clone(),
        catalog: db.catalog_stats().await?,
        runs: db
            .recent_runs(args.limit)
            .await?
            .into_iter()
            .map(RunRow::from)
            .collect(),
    };

    if flags.format == OutputFormat::Table {
        output(&response.catalog, flags.format)?;
        println!();
        return output(&response.runs, flags.format);
    }
    output(&response, flags.format)
}
