//! Entity structs for persisted catalog state.
//!
//! Each entity maps to a table in the libSQL catalog database.
//! All structs derive `Serialize`, `Deserialize`, and `JsonSchema`.

mod barcode;
mod fingerprint;
mod price;
mod product;
mod stats;
mod sync_run;

pub use barcode::BarcodeRecord;
pub use fingerprint::SourceFingerprint;
pub use price::PriceRecord;
pub use product::ProductSnapshot;
pub use stats::CatalogStats;
pub use sync_run::{SyncCounters, SyncRun};
