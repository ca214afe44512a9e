//! Active/inactive reconciliation by set membership.
//!
//! Runs after content reconciliation and is the only place that decides
//! whether a product is currently sellable, regardless of whether anything
//! else about the product changed.
//!
//! Two key sets drive it. An inactive key is activated only if its record
//! was reconciled this pass. An active key is deactivated only if it is
//! absent from the source altogether, so a record that is present but
//! skipped (say, a temporary zero price) leaves the flag as it was.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use catsync_db::SyncSession;

use crate::error::SyncError;

/// Keys whose active flag must flip.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActivityPlan {
    pub activate: Vec<String>,
    pub deactivate: Vec<String>,
}

impl ActivityPlan {
    /// Compute the flips from this pass's keys and the persisted flags.
    ///
    /// `seen` holds reconciled keys, `present` every non-blank source key.
    /// Output lists are sorted so batches and logs are deterministic.
    #[must_use]
    pub fn diff(
        seen: &HashSet<String>,
        present: &HashSet<String>,
        active: &HashSet<String>,
        inactive: &HashSet<String>,
    ) -> Self {
        let mut activate: Vec<String> = inactive.intersection(seen).cloned().collect();
        let mut deactivate: Vec<String> = active.difference(present).cloned().collect();
        activate.sort_unstable();
        deactivate.sort_unstable();
        Self {
            activate,
            deactivate,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.activate.is_empty() && self.deactivate.is_empty()
    }
}

/// Rows actually flipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ActivityCounts {
    pub activated: i64,
    pub deactivated: i64,
}

/// Diff this pass's keys against the catalog and apply the flips.
///
/// Reads the current flags through the session, so products created earlier
/// in the same pass are already active and are left alone.
///
/// # Errors
///
/// Returns `SyncError::Database` if a read or batch update fails.
pub async fn apply_activity(
    session: &SyncSession<'_>,
    seen: &HashSet<String>,
    present: &HashSet<String>,
    now: DateTime<Utc>,
) -> Result<(ActivityPlan, ActivityCounts), SyncError> {
    let db = session.catalog();
    let active = db.product_keys_by_active(true).await?;
    let inactive = db.product_keys_by_active(false).await?;
    let plan = ActivityPlan::diff(seen, present, &active, &inactive);

    let activated = db.set_products_active(&plan.activate, true, now).await?;
    let deactivated = db.set_products_active(&plan.deactivate, false, now).await?;
    let counts = ActivityCounts {
        activated: i64::try_from(activated).unwrap_or(i64::MAX),
        deactivated: i64::try_from(deactivated).unwrap_or(i64::MAX),
    };

    info!(
        activated = counts.activated,
        deactivated = counts.deactivated,
        "Applied activity changes"
    );
    Ok((plan, counts))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn set(keys: &[&str]) -> HashSet<String> {
        keys.iter().map(|k| (*k).to_string()).collect()
    }

    #[test]
    fn reactivates_present_and_deactivates_absent() {
        let seen = set(&["a", "b", "new"]);
        let active = set(&["a", "gone", "new"]);
        let inactive = set(&["b", "still_gone"]);

        let plan = ActivityPlan::diff(&seen, &seen, &active, &inactive);
        assert_eq!(
            plan,
            ActivityPlan {
                activate: vec!["b".into()],
                deactivate: vec!["gone".into()],
            }
        );
    }

    #[test]
    fn empty_source_deactivates_everything() {
        let none = HashSet::new();
        let plan = ActivityPlan::diff(&none, &none, &set(&["b", "a"]), &set(&["c"]));
        assert_eq!(plan.activate, Vec::<String>::new());
        assert_eq!(plan.deactivate, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn steady_state_is_empty() {
        let plan = ActivityPlan::diff(&set(&["a"]), &set(&["a"]), &set(&["a"]), &set(&["z"]));
        assert!(plan.is_empty());
    }

    #[test]
    fn skipped_but_present_keys_keep_their_flag() {
        let seen = set(&["ok"]);
        let present = set(&["ok", "zero_price", "blank_desc"]);
        let active = set(&["ok", "zero_price"]);
        let inactive = set(&["blank_desc"]);

        let plan = ActivityPlan::diff(&seen, &present, &active, &inactive);
        assert!(plan.is_empty(), "got {plan:?}");
    }
}
