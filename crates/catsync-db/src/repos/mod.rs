//! Repository modules for catalog entities.
//!
//! Each module adds methods to `CatalogDb` via `impl CatalogDb` blocks.

pub mod barcodes;
pub mod fingerprints;
pub mod prices;
pub mod products;
pub mod stats;
pub mod sync_log;
