//! Barcode repository. Append-only: nothing here removes a barcode.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use catsync_core::entities::BarcodeRecord;

use crate::CatalogDb;
use crate::error::DatabaseError;
use crate::helpers::{get_flag, parse_datetime};

impl CatalogDb {
    /// Attach a barcode to a product.
    ///
    /// Returns `false` when the pair is already on file.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the insert fails.
    pub async fn insert_barcode(
        &self,
        product_key: &str,
        barcode: &str,
        is_primary: bool,
        now: DateTime<Utc>,
    ) -> Result<bool, DatabaseError> {
        let inserted = self
            .conn()
            .execute(
                "INSERT OR IGNORE INTO barcodes (product_key, barcode, is_primary, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                libsql::params![product_key, barcode, i64::from(is_primary), now.to_rfc3339()],
            )
            .await?;
        Ok(inserted > 0)
    }

    /// Barcodes for one product, primary first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query or row parsing fails.
    pub async fn barcodes_for(&self, product_key: &str) -> Result<Vec<BarcodeRecord>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT product_key, barcode, is_primary, created_at FROM barcodes
                 WHERE product_key = ?1 ORDER BY is_primary DESC, created_at, barcode",
                [product_key],
            )
            .await?;
        let mut barcodes = Vec::new();
        while let Some(row) = rows.next().await? {
            barcodes.push(BarcodeRecord {
                product_key: row.get::<String>(0)?,
                barcode: row.get::<String>(1)?,
                is_primary: get_flag(&row, 2)?,
                created_at: parse_datetime(&row.get::<String>(3)?)?,
            });
        }
        Ok(barcodes)
    }

    /// Every barcode grouped by product. Read once at the start of a pass.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn load_barcode_sets(&self) -> Result<HashMap<String, HashSet<String>>, DatabaseError> {
        let mut rows = self
            .conn()
            .query("SELECT product_key, barcode FROM barcodes", ())
            .await?;
        let mut sets: HashMap<String, HashSet<String>> = HashMap::new();
        while let Some(row) = rows.next().await? {
            sets.entry(row.get::<String>(0)?)
                .or_default()
                .insert(row.get::<String>(1)?);
        }
        Ok(sets)
    }
}
