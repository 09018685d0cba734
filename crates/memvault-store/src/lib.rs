//! Scope-partitioned memory store with identity auditing and snapshots.

pub mod backup;
pub mod error;
pub mod fields;
pub mod identity;
pub mod migration;
pub mod model;
pub mod registry;
mod schema;
pub mod store;

/// Snapshot and duplicate-report types.
pub use backup::{DuplicateOccurrence, DuplicateReport, Snapshot, find_duplicate_ids};
/// Store error type.
pub use error::StoreError;
/// Structured payload parsing.
pub use fields::{FieldMap, FieldStatus, FieldValue, ParsedFields};
/// Identifier classification.
pub use identity::{IdentityClass, IdentityReport, classify, partition};
/// Two-phase purge and snapshot management.
pub use migration::{MigrationManager, PurgeOutcome, PurgePlan, PurgeState};
/// Record and snapshot provenance models.
pub use model::{BackupMetadata, MemoryRecord};
/// Per-scope reporting view.
pub use registry::ScopeRegistry;
/// Document store and its connection settings.
pub use store::{JournalMode, MemoryStore, StoreOptions};
/// Table names of the persisted schema.
pub use schema::{BACKUP_METADATA_TABLE, MEMORIES_TABLE};
