use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::SyncStatus;

/// Aggregate counters recorded on a completed sync run.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct SyncCounters {
    /// Records examined after merging, including skipped ones.
    pub processed: i64,
    /// Products created by this run.
    pub added: i64,
    /// Existing products whose price or description changed.
    pub updated: i64,
    /// Records excluded from reconciliation.
    pub skipped: i64,
    pub activated: i64,
    pub deactivated: i64,
}

/// One row of the sync ledger.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct SyncRun {
    pub id: i64,
    pub sync_type: String,
    pub source_file: String,
    pub status: SyncStatus,
    pub counters: SyncCounters,
    pub error_message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}
