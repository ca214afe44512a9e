//! Product repository.
//!
//! Creates products, applies description drift, and flips the active flag in
//! bulk. Enrichment fields are owned by external tooling and only written here
//! when a description change forces a review.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use catsync_core::entities::ProductSnapshot;
use catsync_core::enums::DataQuality;

use crate::CatalogDb;
use crate::error::DatabaseError;
use crate::helpers::{
    IN_CLAUSE_BATCH, get_flag, get_opt_string, parse_datetime, parse_enum, placeholders,
};

const PRODUCT_COLUMNS: &str = "product_key, description, active, data_quality, needs_enrichment, \
     enrichment_notes, created_at, updated_at";

impl CatalogDb {
    /// Create an active product awaiting enrichment.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the key already exists or the insert fails.
    pub async fn insert_product(
        &self,
        product_key: &str,
        description: &str,
        now: DateTime<Utc>,
    ) -> Result<ProductSnapshot, DatabaseError> {
        let quality = DataQuality::NeedsDescription;
        self.conn()
            .execute(
                "INSERT INTO products (product_key, description, active, data_quality, needs_enrichment, created_at, updated_at)
                 VALUES (?1, ?2, 1, ?3, 1, ?4, ?4)",
                libsql::params![product_key, description, quality.as_str(), now.to_rfc3339()],
            )
            .await?;

        Ok(ProductSnapshot {
            product_key: product_key.to_string(),
            description: description.to_string(),
            active: true,
            data_quality: quality,
            needs_enrichment: true,
            enrichment_notes: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Replace a product's description and force it back into review.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if the key does not exist.
    pub async fn apply_description_change(
        &self,
        product_key: &str,
        new_description: &str,
        note: &str,
        now: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        let changed = self
            .conn()
            .execute(
                "UPDATE products
                 SET description = ?1, data_quality = ?2, needs_enrichment = 1,
                     enrichment_notes = ?3, updated_at = ?4
                 WHERE product_key = ?5",
                libsql::params![
                    new_description,
                    DataQuality::NeedsReview.as_str(),
                    note,
                    now.to_rfc3339(),
                    product_key
                ],
            )
            .await?;
        if changed == 0 {
            return Err(DatabaseError::NoResult);
        }
        Ok(())
    }

    /// Get a product by key.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if the product does not exist.
    pub async fn get_product(&self, product_key: &str) -> Result<ProductSnapshot, DatabaseError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE product_key = ?1");
        let mut rows = self.conn().query(&sql, [product_key]).await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        row_to_product(&row)
    }

    /// Load every product. Read once at the start of a pass.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query or row parsing fails.
    pub async fn load_products(&self) -> Result<Vec<ProductSnapshot>, DatabaseError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY product_key");
        let mut rows = self.conn().query(&sql, ()).await?;
        let mut products = Vec::new();
        while let Some(row) = rows.next().await? {
            products.push(row_to_product(&row)?);
        }
        Ok(products)
    }

    /// Keys of products with the given active flag.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn product_keys_by_active(&self, active: bool) -> Result<HashSet<String>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT product_key FROM products WHERE active = ?1",
                [i64::from(active)],
            )
            .await?;
        let mut keys = HashSet::new();
        while let Some(row) = rows.next().await? {
            keys.insert(row.get::<String>(0)?);
        }
        Ok(keys)
    }

    /// Set the active flag on many products, in `IN (...)` batches.
    ///
    /// Returns the number of rows whose flag actually changed.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if any batch update fails.
    pub async fn set_products_active(
        &self,
        keys: &[String],
        active: bool,
        now: DateTime<Utc>,
    ) -> Result<u64, DatabaseError> {
        let mut changed = 0;
        let stamp = now.to_rfc3339();

        for chunk in keys.chunks(IN_CLAUSE_BATCH) {
            let sql = format!(
                "UPDATE products SET active = ?{flag}, updated_at = ?{ts}
                 WHERE active != ?{flag} AND product_key IN ({list})",
                flag = chunk.len() + 1,
                ts = chunk.len() + 2,
                list = placeholders(chunk.len()),
            );
            let mut params: Vec<libsql::Value> =
                chunk.iter().map(|k| libsql::Value::from(k.clone())).collect();
            params.push(i64::from(active).into());
            params.push(stamp.clone().into());

            changed += self
                .conn()
                .execute(&sql, libsql::params_from_iter(params))
                .await?;
        }

        Ok(changed)
    }
}

/// Convert a libSQL row to a `ProductSnapshot`.
fn row_to_product(row: &libsql::Row) -> Result<ProductSnapshot, DatabaseError> {
    Ok(ProductSnapshot {
        product_key: row.get::<String>(0)?,
        description: row.get::<String>(1)?,
        active: get_flag(row, 2)?,
        data_quality: parse_enum(&row.get::<String>(3)?)?,
        needs_enrichment: get_flag(row, 4)?,
        enrichment_notes: get_opt_string(row, 5)?,
        created_at: parse_datetime(&row.get::<String>(6)?)?,
        updated_at: parse_datetime(&row.get::<String>(7)?)?,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::test_support::test_db;

    #[tokio::test]
    async fn new_product_needs_description() {
        let db = test_db().await;
        db.insert_product("1000016", "WHITE BREAD 350G", Utc::now())
            .await
            .unwrap();

        let product = db.get_product("1000016").await.unwrap();
        assert_eq!(product.description, "WHITE BREAD 350G");
        assert!(product.active);
        assert_eq!(product.data_quality, DataQuality::NeedsDescription);
        assert!(product.needs_enrichment);
        assert_eq!(product.enrichment_notes, None);
    }

    #[tokio::test]
    async fn duplicate_key_is_rejected() {
        let db = test_db().await;
        db.insert_product("1", "A", Utc::now()).await.unwrap();
        assert!(db.insert_product("1", "B", Utc::now()).await.is_err());
    }

    #[tokio::test]
    async fn description_change_forces_review() {
        let db = test_db().await;
        db.insert_product("1000016", "WHITE BREAD 350G", Utc::now())
            .await
            .unwrap();
        db.conn()
            .execute(
                "UPDATE products SET data_quality = 'COMPLETE', needs_enrichment = 0 WHERE product_key = '1000016'",
                (),
            )
            .await
            .unwrap();

        db.apply_description_change("1000016", "WHITE BREAD 400G", "review", Utc::now())
            .await
            .unwrap();

        let product = db.get_product("1000016").await.unwrap();
        assert_eq!(product.description, "WHITE BREAD 400G");
        assert_eq!(product.data_quality, DataQuality::NeedsReview);
        assert!(product.needs_enrichment);
        assert_eq!(product.enrichment_notes.as_deref(), Some("review"));
    }

    #[tokio::test]
    async fn description_change_on_missing_key_is_no_result() {
        let db = test_db().await;
        let err = db
            .apply_description_change("ghost", "X", "review", Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::NoResult), "got {err:?}");
    }

    #[tokio::test]
    async fn bulk_activation_spans_batches_and_counts_real_flips() {
        let db = test_db().await;
        let keys: Vec<String> = (0..1_203).map(|i| format!("K{i:05}")).collect();
        for key in &keys {
            db.insert_product(key, "ITEM", Utc::now()).await.unwrap();
        }

        let deactivated = db.set_products_active(&keys, false, Utc::now()).await.unwrap();
        assert_eq!(deactivated, 1_203);
        assert_eq!(db.product_keys_by_active(false).await.unwrap().len(), 1_203);

        // Already inactive rows are not counted again.
        let again = db.set_products_active(&keys[..10], false, Utc::now()).await.unwrap();
        assert_eq!(again, 0);

        let reactivated = db
            .set_products_active(&keys[..600], true, Utc::now())
            .await
            .unwrap();
        assert_eq!(reactivated, 600);
        assert_eq!(db.product_keys_by_active(true).await.unwrap().len(), 600);
    }

    #[tokio::test]
    async fn load_products_reads_all_rows() {
        let db = test_db().await;
        db.insert_product("b", "B", Utc::now()).await.unwrap();
        db.insert_product("a", "A", Utc::now()).await.unwrap();

        let keys: Vec<String> = db
            .load_products()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.product_key)
            .collect();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
    }
}
