use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Size and modification time of a source extract as of its last successful sync.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct SourceFingerprint {
    pub sync_type: String,
    pub source_path: String,
    pub size_bytes: i64,
    pub modified_at: DateTime<Utc>,
    pub recorded_at: DateTime<Utc>,
}

impl SourceFingerprint {
    /// Whether a file with this size and mtime is unchanged since the
    /// fingerprint was recorded.
    #[must_use]
    pub fn matches(&self, size_bytes: i64, modified_at: DateTime<Utc>) -> bool {
        self.size_bytes == size_bytes && self.modified_at == modified_at
    }
}
