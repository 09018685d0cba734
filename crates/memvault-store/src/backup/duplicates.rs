//! Cross-snapshot duplicate identifier detection.
//!
//! Duplicates are reported with full provenance and never resolved here;
//! deciding which copy survives a merge is left to a reviewer.

use super::Snapshot;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One place a duplicated identifier was seen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateOccurrence {
    /// Scope of the record in that snapshot.
    pub scope: String,
    /// Label of the snapshot the record came from.
    pub source: String,
}

/// Identifiers seen more than once, with every occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateReport {
    entries: BTreeMap<String, Vec<DuplicateOccurrence>>,
}

impl DuplicateReport {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of duplicated identifiers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Occurrences of one identifier, if it is duplicated.
    pub fn get(&self, id: &str) -> Option<&[DuplicateOccurrence]> {
        self.entries.get(id).map(Vec::as_slice)
    }

    /// Duplicated identifiers in order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[DuplicateOccurrence])> {
        self.entries
            .iter()
            .map(|(id, occurrences)| (id.as_str(), occurrences.as_slice()))
    }

    /// Consume the report into its underlying mapping.
    pub fn into_map(self) -> BTreeMap<String, Vec<DuplicateOccurrence>> {
        self.entries
    }
}

/// Report every identifier that occurs more than once across `snapshots`.
///
/// Occurrences are listed in snapshot order, then record order. An id
/// repeated inside one legacy snapshot is reported as well.
pub fn find_duplicate_ids(snapshots: &[Snapshot]) -> DuplicateReport {
    let mut seen: BTreeMap<String, Vec<DuplicateOccurrence>> = BTreeMap::new();
    for snapshot in snapshots {
        for record in &snapshot.records {
            seen.entry(record.id.clone())
                .or_default()
                .push(DuplicateOccurrence {
                    scope: record.scope.clone(),
                    source: snapshot.label.clone(),
                });
        }
    }
    seen.retain(|_, occurrences| occurrences.len() > 1);
    DuplicateReport { entries: seen }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MemoryRecord;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn snapshot(label: &str, records: Vec<MemoryRecord>) -> Snapshot {
        Snapshot::capture(label.to_string(), Utc::now(), records)
    }

    #[test]
    fn reports_shared_id_with_both_origins() {
        let id = "11112222-3333-4444-5555-666677778888";
        let first = snapshot(
            "backup-a",
            vec![
                MemoryRecord::with_id(id, "Note", "x"),
                MemoryRecord::new("Note", "only in a"),
            ],
        );
        let second = snapshot(
            "backup-b",
            vec![MemoryRecord::with_id(id, "ArchitecturalDecision", "y")],
        );

        let report = find_duplicate_ids(&[first, second]);
        assert_eq!(report.len(), 1);
        assert_eq!(
            report.get(id).expect("duplicate"),
            &[
                DuplicateOccurrence {
                    scope: "Note".to_string(),
                    source: "backup-a".to_string(),
                },
                DuplicateOccurrence {
                    scope: "ArchitecturalDecision".to_string(),
                    source: "backup-b".to_string(),
                },
            ]
        );
    }

    #[test]
    fn disjoint_snapshots_have_no_duplicates() {
        let first = snapshot("a", vec![MemoryRecord::new("Note", "x")]);
        let second = snapshot("b", vec![MemoryRecord::new("Note", "y")]);
        assert!(find_duplicate_ids(&[first, second]).is_empty());
        assert!(find_duplicate_ids(&[]).is_empty());
    }

    #[test]
    fn repeats_inside_one_snapshot_are_reported() {
        let legacy = snapshot(
            "legacy",
            vec![
                MemoryRecord::with_id("dup", "Note", "a"),
                MemoryRecord::with_id("dup", "Note", "b"),
            ],
        );
        let report = find_duplicate_ids(std::slice::from_ref(&legacy));
        assert_eq!(report.ids().collect::<Vec<_>>(), vec!["dup"]);
        assert_eq!(report.get("dup").map(<[_]>::len), Some(2));
    }
}
