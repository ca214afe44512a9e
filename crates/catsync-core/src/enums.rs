//! Status enums and classification kinds for catsync.
//!
//! Persisted enums serialize as `SCREAMING_SNAKE_CASE`, matching the values
//! stored in the catalog database (`IN_PROGRESS`, `NEEDS_REVIEW`, ...).
//! `SyncStatus` provides `allowed_next_states()` to enforce valid ledger
//! transitions at the application layer.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// SyncStatus
// ---------------------------------------------------------------------------

/// Status of a sync run in the ledger.
///
/// ```text
/// in_progress → success
///             → failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncStatus {
    InProgress,
    Success,
    Failed,
}

impl SyncStatus {
    /// Valid next states from the current state.
    #[must_use]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::InProgress => &[Self::Success, Self::Failed],
            Self::Success | Self::Failed => &[],
        }
    }

    /// Check whether transitioning to `next` is allowed.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    /// Whether the run has reached a final state.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }

    /// Return the string representation used in SQL storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InProgress => "IN_PROGRESS",
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// DataQuality
// ---------------------------------------------------------------------------

/// Enrichment state of a product record.
///
/// New products start as `NeedsDescription`. A description drift forces
/// `NeedsReview`. Only external enrichment tooling promotes to `Complete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataQuality {
    Complete,
    NeedsDescription,
    NeedsReview,
}

impl DataQuality {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Complete => "COMPLETE",
            Self::NeedsDescription => "NEEDS_DESCRIPTION",
            Self::NeedsReview => "NEEDS_REVIEW",
        }
    }

    /// Whether a product in this state still requires enrichment work.
    #[must_use]
    pub const fn needs_enrichment(self) -> bool {
        !matches!(self, Self::Complete)
    }
}

impl fmt::Display for DataQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ChangeKind
// ---------------------------------------------------------------------------

/// Classification of a detected difference between source and catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    NewProduct,
    PriceChange,
    DescriptionChange,
    BarcodeAdded,
}

impl ChangeKind {
    /// All kinds, in report order.
    pub const ALL: [Self; 4] = [
        Self::NewProduct,
        Self::PriceChange,
        Self::DescriptionChange,
        Self::BarcodeAdded,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NewProduct => "new_product",
            Self::PriceChange => "price_change",
            Self::DescriptionChange => "description_change",
            Self::BarcodeAdded => "barcode_added",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// SkipReason
// ---------------------------------------------------------------------------

/// Why an incoming record was excluded from reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingKey,
    MissingDescription,
    NonPositivePrice,
}

impl SkipReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingKey => "missing_key",
            Self::MissingDescription => "missing_description",
            Self::NonPositivePrice => "non_positive_price",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
