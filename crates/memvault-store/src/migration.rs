//! Snapshots, restores, and the two-phase purge of legacy identifiers.
//!
//! Purging is split into a plan and a commit. `plan_purge` only reads; the
//! returned plan is the thing a human confirms. `commit_purge` consumes the
//! plan, re-derives the invalid set inside the same write transaction that
//! deletes, and refuses with `PlanStale` if anything changed in between.

use crate::backup::Snapshot;
use crate::error::StoreError;
use crate::identity;
use crate::store::{self, MemoryStore};
use chrono::Utc;
use log::{debug, info, warn};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Lifecycle of a purge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PurgeState {
    /// No plan outstanding.
    #[default]
    Idle,
    /// Candidates computed, nothing deleted yet.
    Planned,
    /// Every candidate deleted in one transaction.
    Committed,
    /// Plan discarded; storage untouched.
    Aborted,
}

/// Candidate set computed by `plan_purge`, awaiting commit or abort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurgePlan {
    candidates: BTreeSet<String>,
}

impl PurgePlan {
    /// Identifiers that would be deleted.
    pub fn candidates(&self) -> &BTreeSet<String> {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Final outcome of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurgeOutcome {
    /// `Committed` or `Aborted`.
    pub state: PurgeState,
    /// Records actually removed.
    pub deleted: usize,
}

/// Maintenance layer over a shared store handle.
#[derive(Debug, Clone)]
pub struct MigrationManager {
    store: Arc<MemoryStore>,
}

impl MigrationManager {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }

    /// Stored identifiers that are not canonical.
    pub fn find_invalid_ids(&self) -> Result<BTreeSet<String>, StoreError> {
        let (_, invalid) = identity::partition(self.store.ids()?);
        Ok(invalid)
    }

    /// Compute the purge candidate set without touching storage.
    pub fn plan_purge(&self) -> Result<PurgePlan, StoreError> {
        let candidates = self.find_invalid_ids()?;
        info!("planned purge of legacy ids (candidates={})", candidates.len());
        Ok(PurgePlan { candidates })
    }

    /// Delete the planned candidates in one transaction.
    ///
    /// The invalid set is re-derived under the write lock; if it no longer
    /// equals the plan nothing is deleted and `PlanStale` is returned.
    pub fn commit_purge(&self, plan: PurgePlan) -> Result<PurgeOutcome, StoreError> {
        let deleted = self.store.with_write_transaction(|tx| {
            let (_, current) = identity::partition(store::list_ids(tx)?);
            if current != plan.candidates {
                warn!(
                    "purge plan is stale (planned={}, current={})",
                    plan.candidates.len(),
                    current.len()
                );
                return Err(StoreError::PlanStale {
                    planned: plan.candidates.len(),
                    current: current.len(),
                });
            }
            let mut deleted = 0;
            let mut stmt = tx.prepare("DELETE FROM memories WHERE id = ?1")?;
            for id in &current {
                deleted += stmt.execute([id])?;
            }
            Ok(deleted)
        })?;
        info!("committed purge (deleted={})", deleted);
        Ok(PurgeOutcome {
            state: PurgeState::Committed,
            deleted,
        })
    }

    /// Discard a plan; storage is untouched.
    pub fn abort_purge(&self, plan: PurgePlan) -> PurgeOutcome {
        debug!("aborted purge (candidates={})", plan.len());
        PurgeOutcome {
            state: PurgeState::Aborted,
            deleted: 0,
        }
    }

    /// Export every record and provenance in one read transaction.
    pub fn snapshot(&self) -> Result<Snapshot, StoreError> {
        let captured_at = Utc::now();
        let records = self
            .store
            .with_read_transaction(|tx| Ok(store::list_records(tx, None)?))?;
        let label = format!(
            "{}@{}",
            self.store.path().display(),
            captured_at.to_rfc3339()
        );
        info!("captured snapshot (records={})", records.len());
        Ok(Snapshot::capture(label, captured_at, records))
    }

    /// Snapshot into `<dir>/<prefix>-<UTC timestamp>.db` and return the path.
    pub fn backup_to_dir(&self, dir: impl AsRef<Path>, prefix: &str) -> Result<PathBuf, StoreError> {
        let snapshot = self.snapshot()?;
        let stamp = snapshot
            .metadata
            .captured_at
            .unwrap_or_else(Utc::now)
            .format("%Y%m%dT%H%M%S%.6fZ");
        let path = dir.as_ref().join(format!("{prefix}-{stamp}.db"));
        snapshot.write_to(&path)?;
        Ok(path)
    }

    /// Upsert every snapshot record in one transaction.
    ///
    /// A snapshot that repeats an identifier is refused as a whole.
    pub fn restore(&self, snapshot: &Snapshot) -> Result<usize, StoreError> {
        if let Some(id) = snapshot.first_repeated_id() {
            return Err(StoreError::DuplicateInSnapshot(id.to_string()));
        }
        if let Some(record) = snapshot
            .records
            .iter()
            .find(|record| record.scope.trim().is_empty())
        {
            return Err(StoreError::EmptyScope(record.id.clone()));
        }
        let restored = self.store.with_write_transaction(|tx| {
            for record in &snapshot.records {
                store::upsert_record(tx, record)?;
            }
            Ok(snapshot.records.len())
        })?;
        info!(
            "restored snapshot (source={}, records={})",
            snapshot.label, restored
        );
        Ok(restored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MemoryRecord;
    use pretty_assertions::assert_eq;
    use tempfile::{TempDir, tempdir};

    fn manager() -> (TempDir, Arc<MemoryStore>, MigrationManager) {
        let temp = tempdir().expect("tempdir");
        let store = Arc::new(MemoryStore::open(temp.path().join("memories.db")).expect("store"));
        let manager = MigrationManager::new(store.clone());
        (temp, store, manager)
    }

    #[test]
    fn purge_state_starts_idle() {
        assert_eq!(PurgeState::default(), PurgeState::Idle);
    }

    #[test]
    fn plan_does_not_mutate() {
        let (_temp, store, manager) = manager();
        store
            .put(&MemoryRecord::with_id("src/lib.rs", "Note", "x"))
            .expect("put");
        let plan = manager.plan_purge().expect("plan");
        assert_eq!(plan.len(), 1);
        assert_eq!(store.count().expect("count"), 1);
    }

    #[test]
    fn abort_leaves_store_untouched() {
        let (_temp, store, manager) = manager();
        store
            .put(&MemoryRecord::with_id("src/lib.rs", "Note", "x"))
            .expect("put");
        let plan = manager.plan_purge().expect("plan");
        let outcome = manager.abort_purge(plan);
        assert_eq!(
            outcome,
            PurgeOutcome {
                state: PurgeState::Aborted,
                deleted: 0
            }
        );
        assert_eq!(store.count().expect("count"), 1);
    }

    #[test]
    fn stale_plan_is_refused_and_nothing_deleted() {
        let (_temp, store, manager) = manager();
        store
            .put(&MemoryRecord::with_id("src/lib.rs", "Note", "x"))
            .expect("put");
        let plan = manager.plan_purge().expect("plan");
        store
            .put(&MemoryRecord::with_id("src/main.rs", "Note", "y"))
            .expect("put late");

        let err = manager.commit_purge(plan).unwrap_err();
        assert!(matches!(
            err,
            StoreError::PlanStale {
                planned: 1,
                current: 2
            }
        ));
        assert_eq!(store.count().expect("count"), 2);
    }

    #[test]
    fn empty_plan_commits_nothing() {
        let (_temp, store, manager) = manager();
        store.put(&MemoryRecord::new("Note", "x")).expect("put");
        let plan = manager.plan_purge().expect("plan");
        assert!(plan.is_empty());
        let outcome = manager.commit_purge(plan).expect("commit");
        assert_eq!(outcome.deleted, 0);
        assert_eq!(outcome.state, PurgeState::Committed);
    }

    #[test]
    fn restore_refuses_repeated_ids() {
        let (_temp, store, manager) = manager();
        let snapshot = Snapshot::capture(
            "legacy".to_string(),
            Utc::now(),
            vec![
                MemoryRecord::with_id("dup", "Note", "a"),
                MemoryRecord::with_id("dup", "Note", "b"),
            ],
        );
        let err = manager.restore(&snapshot).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateInSnapshot(id) if id == "dup"));
        assert_eq!(store.count().expect("count"), 0);
    }
}
