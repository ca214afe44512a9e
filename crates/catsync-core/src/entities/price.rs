use chrono::{DateTime, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A versioned price row. Append-only: retiring a price flips `is_current`,
/// it never overwrites the row.
///
/// Change detection runs on `price_retail`. Case, pack and cost are carried
/// along when the source provides them.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct PriceRecord {
    pub id: i64,
    pub product_key: String,
    pub price_retail: f64,
    pub price_case: Option<f64>,
    pub price_pack: Option<f64>,
    pub cost: Option<f64>,
    pub effective_date: NaiveDate,
    pub is_current: bool,
    pub created_at: DateTime<Utc>,
}
