//! Change detection and application.
//!
//! The catalog is read once into a [`CatalogSnapshot`] at the start of a
//! pass. Each incoming record is compared against it, classified, written
//! through the [`SyncSession`], and the snapshot is updated in step with the
//! write. A key repeated later in the same pass is therefore compared against
//! what the pass itself just wrote.
//!
//! Per record, in source order:
//!
//! 1. Blank key, blank description or a price that is missing or `<= 0`: skip.
//! 2. Unknown key: create the product and its first current price.
//! 3. Description differs byte-for-byte: replace it and force review.
//! 4. Current price differs by more than the tolerance: retire it and insert
//!    the new one. No current price at all: insert one silently.
//! 5. Barcodes not yet on file for the key: insert them.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info};

use catsync_core::changes::{ChangeEvent, ChangeSet};
use catsync_core::entities::SyncCounters;
use catsync_core::enums::SkipReason;
use catsync_db::{CatalogDb, NewPrice, SyncSession};
use catsync_dbf::SourceRecord;

use crate::error::SyncError;

/// Enrichment note written when a description change forces review.
pub const DESCRIPTION_REVIEW_NOTE: &str = "Description changed - review for size/property changes";

/// Persisted state the reconciler compares against.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    descriptions: HashMap<String, String>,
    prices: HashMap<String, f64>,
    barcodes: HashMap<String, HashSet<String>>,
}

impl CatalogSnapshot {
    /// Read products, current prices and barcodes in one go.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Database` if any of the reads fails.
    pub async fn load(db: &CatalogDb) -> Result<Self, SyncError> {
        let descriptions = db
            .load_products()
            .await?
            .into_iter()
            .map(|p| (p.product_key, p.description))
            .collect();
        let prices = db
            .load_current_prices()
            .await?
            .into_iter()
            .map(|(key, price)| (key, price.price_retail))
            .collect();
        let barcodes = db.load_barcode_sets().await?;

        Ok(Self {
            descriptions,
            prices,
            barcodes,
        })
    }

    #[must_use]
    pub fn product_count(&self) -> usize {
        self.descriptions.len()
    }
}

/// Skipped records by reason.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct SkipCounts {
    pub missing_key: i64,
    pub missing_description: i64,
    pub non_positive_price: i64,
}

impl SkipCounts {
    fn record(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::MissingKey => self.missing_key += 1,
            SkipReason::MissingDescription => self.missing_description += 1,
            SkipReason::NonPositivePrice => self.non_positive_price += 1,
        }
    }
}

/// Result of one reconciliation pass.
#[derive(Debug, Clone, Default)]
pub struct ReconcileOutcome {
    /// Processed/added/updated/skipped. Activity counters are filled later.
    pub counters: SyncCounters,
    pub skips: SkipCounts,
    pub changes: ChangeSet,
    /// Keys of every record that was reconciled (not skipped).
    pub seen: HashSet<String>,
    /// Every non-blank key in the source, skipped or not.
    pub present: HashSet<String>,
    /// Source fields that decoded as null across all records.
    pub field_errors: i64,
}

/// Why a record cannot be reconciled, if it cannot.
#[must_use]
pub fn skip_reason(record: &SourceRecord) -> Option<SkipReason> {
    if record.key.is_empty() {
        return Some(SkipReason::MissingKey);
    }
    if record.description.as_deref().is_none_or(str::is_empty) {
        return Some(SkipReason::MissingDescription);
    }
    if record.price.is_none_or(|p| p <= 0.0) {
        return Some(SkipReason::NonPositivePrice);
    }
    None
}

pub struct Reconciler {
    tolerance: f64,
    today: NaiveDate,
    now: DateTime<Utc>,
}

impl Reconciler {
    /// Reconciler stamping writes with a fixed time.
    #[must_use]
    pub fn at(tolerance: f64, now: DateTime<Utc>) -> Self {
        Self {
            tolerance,
            today: now.date_naive(),
            now,
        }
    }

    /// Reconcile every record, in order, through the session.
    ///
    /// Record-level exclusions are counted; any store error aborts the pass.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Database` on the first failed write or commit.
    pub async fn reconcile(
        &self,
        session: &mut SyncSession<'_>,
        snapshot: &mut CatalogSnapshot,
        records: &[SourceRecord],
    ) -> Result<ReconcileOutcome, SyncError> {
        let mut outcome = ReconcileOutcome::default();

        for record in records {
            outcome.counters.processed += 1;
            outcome.field_errors += i64::try_from(record.decode_errors).unwrap_or(i64::MAX);
            if !record.key.is_empty() {
                outcome.present.insert(record.key.clone());
            }

            if let Some(reason) = skip_reason(record) {
                debug!(key = %record.key, %reason, "Skipping record");
                outcome.counters.skipped += 1;
                outcome.skips.record(reason);
            } else {
                self.apply(session.catalog(), snapshot, record, &mut outcome)
                    .await?;
                outcome.seen.insert(record.key.clone());
            }

            session.checkpoint().await?;
        }

        info!(
            processed = outcome.counters.processed,
            added = outcome.counters.added,
            updated = outcome.counters.updated,
            skipped = outcome.counters.skipped,
            changes = outcome.changes.len(),
            "Reconciled records"
        );
        Ok(outcome)
    }

    async fn apply(
        &self,
        db: &CatalogDb,
        snapshot: &mut CatalogSnapshot,
        record: &SourceRecord,
        outcome: &mut ReconcileOutcome,
    ) -> Result<(), SyncError> {
        let key = record.key.as_str();
        let description = record.description.as_deref().unwrap_or_default();
        let price = record.price_or_zero();
        let new_price = NewPrice {
            product_key: key,
            price_retail: price,
            price_case: record.price_case,
            price_pack: record.price_pack,
            cost: record.cost,
        };

        let Some(known_description) = snapshot.descriptions.get(key).cloned() else {
            db.insert_product(key, description, self.now).await?;
            db.insert_current_price(&new_price, self.today, self.now).await?;
            snapshot.descriptions.insert(key.to_string(), description.to_string());
            snapshot.prices.insert(key.to_string(), price);

            outcome.counters.added += 1;
            outcome.changes.push(ChangeEvent::NewProduct {
                product_key: key.to_string(),
                description: description.to_string(),
                price,
            });
            self.add_barcodes(db, snapshot, record, outcome).await?;
            return Ok(());
        };

        let mut changed = false;

        if known_description != description {
            db.apply_description_change(key, description, DESCRIPTION_REVIEW_NOTE, self.now)
                .await?;
            snapshot.descriptions.insert(key.to_string(), description.to_string());
            outcome.changes.push(ChangeEvent::DescriptionChange {
                product_key: key.to_string(),
                old_description: known_description,
                new_description: description.to_string(),
            });
            changed = true;
        }

        match snapshot.prices.get(key).copied() {
            Some(old_price) if (price - old_price).abs() > self.tolerance => {
                db.retire_current_price(key).await?;
                db.insert_current_price(&new_price, self.today, self.now).await?;
                snapshot.prices.insert(key.to_string(), price);
                outcome.changes.push(ChangeEvent::PriceChange {
                    product_key: key.to_string(),
                    description: description.to_string(),
                    old_price,
                    new_price: price,
                });
                changed = true;
            }
            Some(_) => {}
            None => {
                db.insert_current_price(&new_price, self.today, self.now).await?;
                snapshot.prices.insert(key.to_string(), price);
            }
        }

        if changed {
            outcome.counters.updated += 1;
        }
        self.add_barcodes(db, snapshot, record, outcome).await
    }

    async fn add_barcodes(
        &self,
        db: &CatalogDb,
        snapshot: &mut CatalogSnapshot,
        record: &SourceRecord,
        outcome: &mut ReconcileOutcome,
    ) -> Result<(), SyncError> {
        if record.barcodes.is_empty() {
            return Ok(());
        }
        let known = snapshot.barcodes.entry(record.key.clone()).or_default();
        let mut primary_available = known.is_empty();

        for barcode in &record.barcodes {
            if known.contains(barcode) {
                continue;
            }
            let is_primary = primary_available;
            if db.insert_barcode(&record.key, barcode, is_primary, self.now).await? {
                outcome.changes.push(ChangeEvent::BarcodeAdded {
                    product_key: record.key.clone(),
                    barcode: barcode.clone(),
                    is_primary,
                });
            }
            known.insert(barcode.clone());
            primary_available = false;
        }
        Ok(())
    }
}
