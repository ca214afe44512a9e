//! Price history repository.
//!
//! Prices are append-only. A change flips the old current row to
//! `is_current = 0` and inserts a new current row; nothing is overwritten.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};

use catsync_core::entities::PriceRecord;

use crate::CatalogDb;
use crate::error::DatabaseError;
use crate::helpers::{format_date, get_flag, parse_date, parse_datetime};

const PRICE_COLUMNS: &str = "id, product_key, price_retail, price_case, price_pack, cost, \
     effective_date, is_current, created_at";

/// Values for a new current price row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewPrice<'a> {
    pub product_key: &'a str,
    pub price_retail: f64,
    pub price_case: Option<f64>,
    pub price_pack: Option<f64>,
    pub cost: Option<f64>,
}

impl CatalogDb {
    /// Insert a new current price row.
    ///
    /// The caller must retire any existing current row first; the partial
    /// unique index rejects a second current row for the same key.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the insert fails.
    pub async fn insert_current_price(
        &self,
        price: &NewPrice<'_>,
        effective_date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<PriceRecord, DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO prices (product_key, price_retail, price_case, price_pack, cost, effective_date, is_current, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7)",
                libsql::params![
                    price.product_key,
                    price.price_retail,
                    price.price_case,
                    price.price_pack,
                    price.cost,
                    format_date(effective_date),
                    now.to_rfc3339()
                ],
            )
            .await?;

        Ok(PriceRecord {
            id: self.conn().last_insert_rowid(),
            product_key: price.product_key.to_string(),
            price_retail: price.price_retail,
            price_case: price.price_case,
            price_pack: price.price_pack,
            cost: price.cost,
            effective_date,
            is_current: true,
            created_at: now,
        })
    }

    /// Flip the current price row for a key to historical.
    ///
    /// Returns whether a current row existed.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the update fails.
    pub async fn retire_current_price(&self, product_key: &str) -> Result<bool, DatabaseError> {
        let changed = self
            .conn()
            .execute(
                "UPDATE prices SET is_current = 0 WHERE product_key = ?1 AND is_current = 1",
                [product_key],
            )
            .await?;
        Ok(changed > 0)
    }

    /// Current price for one key, if any.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn current_price(&self, product_key: &str) -> Result<Option<PriceRecord>, DatabaseError> {
        let sql = format!("SELECT {PRICE_COLUMNS} FROM prices WHERE product_key = ?1 AND is_current = 1");
        let mut rows = self.conn().query(&sql, [product_key]).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_price(&row)?)),
            None => Ok(None),
        }
    }

    /// Every current price keyed by product. Read once at the start of a pass.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query or row parsing fails.
    pub async fn load_current_prices(&self) -> Result<HashMap<String, PriceRecord>, DatabaseError> {
        let sql = format!("SELECT {PRICE_COLUMNS} FROM prices WHERE is_current = 1");
        let mut rows = self.conn().query(&sql, ()).await?;
        let mut prices = HashMap::new();
        while let Some(row) = rows.next().await? {
            let price = row_to_price(&row)?;
            prices.insert(price.product_key.clone(), price);
        }
        Ok(prices)
    }

    /// Full price history for a key, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query or row parsing fails.
    pub async fn price_history(&self, product_key: &str) -> Result<Vec<PriceRecord>, DatabaseError> {
        let sql = format!(
            "SELECT {PRICE_COLUMNS} FROM prices WHERE product_key = ?1 ORDER BY effective_date, id"
        );
        let mut rows = self.conn().query(&sql, [product_key]).await?;
        let mut history = Vec::new();
        while let Some(row) = rows.next().await? {
            history.push(row_to_price(&row)?);
        }
        Ok(history)
    }
}

/// Convert a libSQL row to a `PriceRecord`.
fn row_to_price(row: &libsql::Row) -> Result<PriceRecord, DatabaseError> {
    Ok(PriceRecord {
        id: row.get::<i64>(0)?,
        product_key: row.get::<String>(1)?,
        price_retail: row.get::<f64>(2)?,
        price_case: row.get::<Option<f64>>(3)?,
        price_pack: row.get::<Option<f64>>(4)?,
        cost: row.get::<Option<f64>>(5)?,
        effective_date: parse_date(&row.get::<String>(6)?)?,
        is_current: get_flag(row, 7)?,
        created_at: parse_datetime(&row.get::<String>(8)?)?,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::test_support::{date, retail, seed_product, test_db};

    #[tokio::test]
    async fn retire_then_insert_keeps_history() {
        let db = test_db().await;
        seed_product(&db, "1000016", "WHITE BREAD 350G", 45.50).await;

        assert!(db.retire_current_price("1000016").await.unwrap());
        db.insert_current_price(&retail("1000016", 48.00), date(2026, 10, 19), Utc::now())
            .await
            .unwrap();

        let history = db.price_history("1000016").await.unwrap();
        let summary: Vec<(f64, bool)> = history.iter().map(|p| (p.price_retail, p.is_current)).collect();
        assert_eq!(summary, vec![(45.50, false), (48.00, true)]);
        assert_eq!(history[1].effective_date, date(2026, 10, 19));
    }

    #[tokio::test]
    async fn two_changes_on_one_day_are_both_kept() {
        let db = test_db().await;
        seed_product(&db, "k", "ITEM", 1.0).await;
        for price in [2.0, 3.0] {
            db.retire_current_price("k").await.unwrap();
            db.insert_current_price(&retail("k", price), date(2026, 10, 19), Utc::now())
                .await
                .unwrap();
        }

        let history = db.price_history("k").await.unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history.iter().filter(|p| p.is_current).count(), 1);
        assert_eq!(db.current_price("k").await.unwrap().unwrap().price_retail, 3.0);
    }

    #[tokio::test]
    async fn insert_without_retire_violates_single_current() {
        let db = test_db().await;
        seed_product(&db, "k", "ITEM", 1.0).await;
        let result = db
            .insert_current_price(&retail("k", 2.0), date(2026, 10, 19), Utc::now())
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn companion_prices_are_stored() {
        let db = test_db().await;
        db.insert_product("k", "ITEM", Utc::now()).await.unwrap();
        let price = NewPrice {
            product_key: "k",
            price_retail: 45.5,
            price_case: Some(520.0),
            price_pack: Some(90.0),
            cost: Some(38.25),
        };
        db.insert_current_price(&price, date(2026, 10, 19), Utc::now())
            .await
            .unwrap();

        let current = db.load_current_prices().await.unwrap();
        let stored = &current["k"];
        assert_eq!(stored.price_case, Some(520.0));
        assert_eq!(stored.price_pack, Some(90.0));
        assert_eq!(stored.cost, Some(38.25));
    }

    #[tokio::test]
    async fn retire_without_current_row_reports_false() {
        let db = test_db().await;
        db.insert_product("k", "ITEM", Utc::now()).await.unwrap();
        assert!(!db.retire_current_price("k").await.unwrap());
        assert_eq!(db.current_price("k").await.unwrap(), None);
    }
}
