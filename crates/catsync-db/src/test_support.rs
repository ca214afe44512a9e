//! Shared test utilities for catsync-db unit tests.

use chrono::{NaiveDate, Utc};

use crate::CatalogDb;
use crate::repos::prices::NewPrice;

/// Open an empty in-memory catalog.
pub async fn test_db() -> CatalogDb {
    CatalogDb::open_local(":memory:").await.unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn retail(key: &str, price: f64) -> NewPrice<'_> {
    NewPrice {
        product_key: key,
        price_retail: price,
        price_case: None,
        price_pack: None,
        cost: None,
    }
}

/// Insert a product with one current retail price.
pub async fn seed_product(db: &CatalogDb, key: &str, description: &str, price: f64) {
    let now = Utc::now();
    db.insert_product(key, description, now).await.unwrap();
    db.insert_current_price(&retail(key, price), date(2026, 10, 1), now)
        .await
        .unwrap();
}
