//! Primary/supplementary extract merge.

use std::collections::HashMap;

use crate::layout::SourceRecord;

/// Merge two extracts by key.
///
/// Records keep the primary's order, followed by keys that only the
/// supplementary extract has. When a key appears in both, the supplementary
/// record replaces the primary one (in the primary's position) if its stamp is
/// textually greater than or equal to the primary's. The comparison is on the
/// stamp text, not on a parsed date.
///
/// Within one extract a repeated key replaces the earlier record. Records with
/// a blank key cannot be matched and pass through unmerged, so the reconciler
/// still sees and counts them.
#[must_use]
pub fn merge_sources(primary: Vec<SourceRecord>, supplementary: Vec<SourceRecord>) -> Vec<SourceRecord> {
    let mut merged: Vec<SourceRecord> = Vec::with_capacity(primary.len() + supplementary.len());
    let mut index: HashMap<String, usize> = HashMap::with_capacity(primary.len());

    for record in primary {
        upsert(&mut merged, &mut index, record, |_, _| true);
    }
    for record in supplementary {
        upsert(&mut merged, &mut index, record, |existing, incoming| {
            incoming.stamp >= existing.stamp
        });
    }

    merged
}

fn upsert(
    merged: &mut Vec<SourceRecord>,
    index: &mut HashMap<String, usize>,
    record: SourceRecord,
    replaces: impl Fn(&SourceRecord, &SourceRecord) -> bool,
) {
    if record.key.is_empty() {
        merged.push(record);
        return;
    }
    match index.get(&record.key) {
        Some(&slot) => {
            if replaces(&merged[slot], &record) {
                merged[slot] = record;
            }
        }
        None => {
            index.insert(record.key.clone(), merged.len());
            merged.push(record);
        }
    }
}
