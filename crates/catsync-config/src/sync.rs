//! Sync engine tuning.

use serde::{Deserialize, Serialize};

fn default_sync_type() -> String {
    "CATALOG_SYNC".to_string()
}

const fn default_batch_size() -> usize {
    1000
}

const fn default_price_tolerance() -> f64 {
    0.01
}

fn default_report_dir() -> String {
    "reports".to_string()
}

fn default_lock_path() -> String {
    ".catsync/sync.lock".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SyncConfig {
    /// Ledger type recorded on every run; crash healing is scoped to it.
    #[serde(default = "default_sync_type")]
    pub sync_type: String,

    /// Records reconciled per committed transaction.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Absolute price difference below which a price is considered unchanged.
    #[serde(default = "default_price_tolerance")]
    pub price_tolerance: f64,

    /// Directory receiving change reports.
    #[serde(default = "default_report_dir")]
    pub report_dir: String,

    /// Lock file guarding against concurrent runs.
    #[serde(default = "default_lock_path")]
    pub lock_path: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            sync_type: default_sync_type(),
            batch_size: default_batch_size(),
            price_tolerance: default_price_tolerance(),
            report_dir: default_report_dir(),
            lock_path: default_lock_path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let config = SyncConfig::default();
        assert_eq!(config.sync_type, "CATALOG_SYNC");
        assert_eq!(config.batch_size, 1000);
        assert!((config.price_tolerance - 0.01).abs() < f64::EPSILON);
        assert_eq!(config.report_dir, "reports");
    }
}
