use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Row counts describing the catalog as a whole.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct CatalogStats {
    pub products: i64,
    pub active_products: i64,
    pub needs_enrichment: i64,
    pub current_prices: i64,
    pub barcodes: i64,
}
