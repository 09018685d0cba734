//! Point-in-time snapshots of a memory store.
//!
//! A snapshot is every record plus provenance metadata. On disk it is a
//! standalone SQLite file with the store's `memories` table and an extra
//! `backup_metadata` key/value table.

mod artifact;
mod duplicates;

pub use duplicates::{DuplicateOccurrence, DuplicateReport, find_duplicate_ids};

use crate::error::StoreError;
use crate::model::{BackupMetadata, MemoryRecord};
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// Exported copy of a store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    /// Where the snapshot came from; used as the origin in duplicate reports.
    pub label: String,
    /// Provenance rows.
    pub metadata: BackupMetadata,
    /// Records ordered by id.
    pub records: Vec<MemoryRecord>,
}

impl Snapshot {
    /// Assemble a snapshot from records read in one transaction.
    pub(crate) fn capture(
        label: String,
        captured_at: DateTime<Utc>,
        records: Vec<MemoryRecord>,
    ) -> Self {
        Self {
            label,
            metadata: BackupMetadata::capture(captured_at, count_scopes(&records)),
            records,
        }
    }

    /// Snapshot of hand-picked records, stamped with the current time.
    pub fn from_records(label: impl Into<String>, records: Vec<MemoryRecord>) -> Self {
        Self::capture(label.into(), Utc::now(), records)
    }

    /// Load a snapshot artifact, labelled with its path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let (metadata, records) = artifact::read(path)?;
        info!(
            "opened snapshot (path={}, records={})",
            path.display(),
            records.len()
        );
        Ok(Self {
            label: path.display().to_string(),
            metadata,
            records,
        })
    }

    /// Replace the origin label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Write the snapshot to a new SQLite artifact.
    ///
    /// Refuses to overwrite an existing file.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        if let Some(id) = self.first_repeated_id() {
            return Err(StoreError::DuplicateInSnapshot(id.to_string()));
        }
        let path = path.as_ref();
        artifact::write(path, &self.metadata, &self.records)?;
        info!(
            "wrote snapshot (path={}, records={})",
            path.display(),
            self.records.len()
        );
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record count per scope, computed from the records.
    pub fn scope_counts(&self) -> BTreeMap<String, usize> {
        count_scopes(&self.records)
    }

    /// First identifier that occurs more than once, if any.
    pub(crate) fn first_repeated_id(&self) -> Option<&str> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .map(|record| record.id.as_str())
            .find(|id| !seen.insert(*id))
    }
}

fn count_scopes(records: &[MemoryRecord]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for record in records {
        *counts.entry(record.scope.clone()).or_insert(0) += 1;
    }
    counts
}
