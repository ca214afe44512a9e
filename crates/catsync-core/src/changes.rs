//! Change events produced by the reconciler.
//!
//! A `ChangeEvent` is ephemeral: it is collected during a pass and consumed
//! only by the report writer. Nothing reads events back into the engine.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::ChangeKind;

/// A single classified difference between an incoming record and the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeEvent {
    NewProduct {
        product_key: String,
        description: String,
        price: f64,
    },
    PriceChange {
        product_key: String,
        description: String,
        old_price: f64,
        new_price: f64,
    },
    DescriptionChange {
        product_key: String,
        old_description: String,
        new_description: String,
    },
    BarcodeAdded {
        product_key: String,
        barcode: String,
        is_primary: bool,
    },
}

impl ChangeEvent {
    #[must_use]
    pub const fn kind(&self) -> ChangeKind {
        match self {
            Self::NewProduct { .. } => ChangeKind::NewProduct,
            Self::PriceChange { .. } => ChangeKind::PriceChange,
            Self::DescriptionChange { .. } => ChangeKind::DescriptionChange,
            Self::BarcodeAdded { .. } => ChangeKind::BarcodeAdded,
        }
    }

    #[must_use]
    pub fn product_key(&self) -> &str {
        match self {
            Self::NewProduct { product_key, .. }
            | Self::PriceChange { product_key, .. }
            | Self::DescriptionChange { product_key, .. }
            | Self::BarcodeAdded { product_key, .. } => product_key,
        }
    }

    /// Signed percentage change for a `PriceChange`, `None` otherwise.
    ///
    /// A zero or negative old price has no meaningful baseline and yields `0.0`.
    #[must_use]
    pub fn pct_change(&self) -> Option<f64> {
        match self {
            Self::PriceChange {
                old_price,
                new_price,
                ..
            } => Some(pct_change(*old_price, *new_price)),
            _ => None,
        }
    }
}

/// Percentage change from `old` to `new`; `0.0` when `old` is not positive.
#[must_use]
pub fn pct_change(old: f64, new: f64) -> f64 {
    if old > 0.0 {
        (new - old) / old * 100.0
    } else {
        0.0
    }
}

/// All events detected during one pass, in detection order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChangeSet {
    events: Vec<ChangeEvent>,
}

impl ChangeSet {
    #[must_use]
    pub const fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn push(&mut self, event: ChangeEvent) {
        self.events.push(event);
    }

    #[must_use]
    pub fn events(&self) -> &[ChangeEvent] {
        &self.events
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events of one kind, in detection order.
    pub fn of_kind(&self, kind: ChangeKind) -> impl Iterator<Item = &ChangeEvent> {
        self.events.iter().filter(move |event| event.kind() == kind)
    }

    #[must_use]
    pub fn count(&self, kind: ChangeKind) -> usize {
        self.of_kind(kind).count()
    }

    /// Price changes ordered by absolute percentage change, largest first.
    ///
    /// Ties keep detection order.
    #[must_use]
    pub fn price_changes_by_magnitude(&self) -> Vec<&ChangeEvent> {
        let mut changes: Vec<&ChangeEvent> = self.of_kind(ChangeKind::PriceChange).collect();
        changes.sort_by(|a, b| {
            let a = a.pct_change().unwrap_or(0.0).abs();
            let b = b.pct_change().unwrap_or(0.0).abs();
            b.total_cmp(&a)
        });
        changes
    }
}

impl Extend<ChangeEvent> for ChangeSet {
    fn extend<T: IntoIterator<Item = ChangeEvent>>(&mut self, iter: T) {
        self.events.extend(iter);
    }
}
