//! Catalog-wide counts for `catsync status`.

use catsync_core::entities::CatalogStats;

use crate::CatalogDb;
use crate::error::DatabaseError;
use crate::helpers::query_count;

impl CatalogDb {
    /// Count products, active products, current prices and barcodes.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if any count query fails.
    pub async fn catalog_stats(&self) -> Result<CatalogStats, DatabaseError> {
        let conn = self.conn();
        Ok(CatalogStats {
            products: query_count(conn, "SELECT COUNT(*) FROM products", ()).await?,
            active_products: query_count(conn, "SELECT COUNT(*) FROM products WHERE active = 1", ()).await?,
            needs_enrichment: query_count(
                conn,
                "SELECT COUNT(*) FROM products WHERE needs_enrichment = 1",
                (),
            )
            .await?,
            current_prices: query_count(conn, "SELECT COUNT(*) FROM prices WHERE is_current = 1", ()).await?,
            barcodes: query_count(conn, "SELECT COUNT(*) FROM barcodes", ()).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::test_support::{seed_product, test_db};

    #[tokio::test]
    async fn counts_reflect_catalog() {
        let db = test_db().await;
        assert_eq!(db.catalog_stats().await.unwrap(), CatalogStats::default());

        seed_product(&db, "a", "A", 1.0).await;
        seed_product(&db, "b", "B", 2.0).await;
        db.insert_barcode("a", "111", true, Utc::now()).await.unwrap();
        db.set_products_active(&["b".to_string()], false, Utc::now())
            .await
            .unwrap();

        assert_eq!(
            db.catalog_stats().await.unwrap(),
            CatalogStats {
                products: 2,
                active_products: 1,
                needs_enrichment: 2,
                current_prices: 2,
                barcodes: 1,
            }
        );
    }
}
