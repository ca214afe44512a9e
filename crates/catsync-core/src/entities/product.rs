use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::DataQuality;

/// Persisted per-key product state.
///
/// `product_key` is stable across every sync and never reused for a different
/// logical product. Enrichment notes are owned by external tooling; the
/// reconciler only writes them when it forces a review.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ProductSnapshot {
    pub product_key: String,
    pub description: String,
    pub active: bool,
    pub data_quality: DataQuality,
    pub needs_enrichment: bool,
    pub enrichment_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
