use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A barcode attached to a product. The first barcode ever recorded for a key
/// is primary; barcodes are never removed by a sync.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct BarcodeRecord {
    pub product_key: String,
    pub barcode: String,
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
}
