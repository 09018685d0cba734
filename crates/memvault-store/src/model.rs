//! Memory record model shared by the store, snapshots, and migrations.

use crate::fields::{self, ParsedFields};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Persisted memory record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MemoryRecord {
    /// Record identifier, unique within a store.
    pub id: String,
    /// Category tag partitioning records.
    pub scope: String,
    /// Human-readable body.
    pub content: String,
    /// Opaque JSON payload, logically an object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_fields: Option<String>,
}

impl MemoryRecord {
    /// Build a record with a freshly minted canonical identifier.
    pub fn new(scope: impl Into<String>, content: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), scope, content)
    }

    /// Build a record under an explicit identifier.
    pub fn with_id(
        id: impl Into<String>,
        scope: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            scope: scope.into(),
            content: content.into(),
            structured_fields: None,
        }
    }

    /// Attach a raw structured payload.
    pub fn with_structured_fields(mut self, raw: impl Into<String>) -> Self {
        self.structured_fields = Some(raw.into());
        self
    }

    /// Parse the structured payload into typed fields.
    ///
    /// A record without a payload yields an empty, well-formed mapping.
    pub fn fields(&self) -> ParsedFields {
        match self.structured_fields.as_deref() {
            Some(raw) => fields::parse(raw),
            None => ParsedFields::default(),
        }
    }
}

/// Provenance rows stored alongside a backup snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackupMetadata {
    /// Capture time of the snapshot, when known.
    pub captured_at: Option<DateTime<Utc>>,
    /// Record count per scope at capture time.
    pub scope_counts: BTreeMap<String, usize>,
    /// Every key/value row, including the ones decoded above.
    pub entries: BTreeMap<String, String>,
}

/// Key for the capture timestamp row.
pub const META_CAPTURED_AT: &str = "captured_at";
/// Key for the total record count row.
pub const META_SOURCE_COUNT: &str = "source_count";
/// Key for the artifact format version row.
pub const META_FORMAT_VERSION: &str = "format_version";
/// Prefix for per-scope count rows.
pub const META_SCOPE_COUNT_PREFIX: &str = "scope_count.";

/// Current snapshot artifact format version.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

impl BackupMetadata {
    /// Build metadata for a snapshot captured now.
    pub fn capture(captured_at: DateTime<Utc>, scope_counts: BTreeMap<String, usize>) -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(META_CAPTURED_AT.to_string(), captured_at.to_rfc3339());
        entries.insert(
            META_SOURCE_COUNT.to_string(),
            scope_counts.values().sum::<usize>().to_string(),
        );
        entries.insert(
            META_FORMAT_VERSION.to_string(),
            SNAPSHOT_FORMAT_VERSION.to_string(),
        );
        for (scope, count) in &scope_counts {
            entries.insert(format!("{META_SCOPE_COUNT_PREFIX}{scope}"), count.to_string());
        }
        Self {
            captured_at: Some(captured_at),
            scope_counts,
            entries,
        }
    }

    /// Rebuild metadata from free-form key/value rows.
    ///
    /// Rows that do not decode are kept in `entries` but otherwise ignored.
    pub fn from_entries(entries: BTreeMap<String, String>) -> Self {
        let captured_at = entries
            .get(META_CAPTURED_AT)
            .and_then(|value| DateTime::parse_from_rfc3339(value).ok())
            .map(|value| value.with_timezone(&Utc));
        let scope_counts = entries
            .iter()
            .filter_map(|(key, value)| {
                let scope = key.strip_prefix(META_SCOPE_COUNT_PREFIX)?;
                let count = value.parse::<usize>().ok()?;
                Some((scope.to_string(), count))
            })
            .collect();
        Self {
            captured_at,
            scope_counts,
            entries,
        }
    }

    /// Recorded source count, if present.
    pub fn source_count(&self) -> Option<usize> {
        self.entries
            .get(META_SOURCE_COUNT)
            .and_then(|value| value.parse().ok())
    }
}
