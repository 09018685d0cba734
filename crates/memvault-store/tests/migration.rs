//! Two-phase purge integration tests.

use memvault_store::{
    IdentityClass, MigrationManager, PurgeState, StoreError, classify,
};
use memvault_test_utils::{canonical_record, open_temp_store, record, seed};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Legacy path ids are found, purged, and canonical records survive.
#[test]
fn purges_path_like_ids() {
    let (_temp, store) = open_temp_store();
    let canonical = record("a1b2c3d4-e5f6-7890-abcd-ef1234567890", "Note", "x");
    seed(&store, &[canonical.clone(), record("C:\\proj\\file.py", "Note", "y")]);
    let manager = MigrationManager::new(Arc::clone(&store));

    let invalid = manager.find_invalid_ids().expect("invalid ids");
    assert_eq!(
        invalid.into_iter().collect::<Vec<_>>(),
        vec!["C:\\proj\\file.py"]
    );

    let plan = manager.plan_purge().expect("plan");
    let outcome = manager.commit_purge(plan).expect("commit");
    assert_eq!(outcome.state, PurgeState::Committed);
    assert_eq!(outcome.deleted, 1);

    let mut expected = BTreeMap::new();
    expected.insert("Note".to_string(), 1);
    assert_eq!(store.count_by_scope().expect("counts"), expected);
    assert!(manager.find_invalid_ids().expect("after").is_empty());
    assert_eq!(store.get(&canonical.id).expect("canonical"), canonical);
}

/// Deleting a planned candidate before commit makes the plan stale.
#[test]
fn plan_goes_stale_when_candidate_disappears() {
    let (_temp, store) = open_temp_store();
    seed(
        &store,
        &[
            record("notes/a.md", "Note", "a"),
            record("notes/b.md", "Note", "b"),
        ],
    );
    let manager = MigrationManager::new(Arc::clone(&store));
    let plan = manager.plan_purge().expect("plan");
    store.delete("notes/a.md").expect("concurrent delete");

    let err = manager.commit_purge(plan).unwrap_err();
    assert!(matches!(
        err,
        StoreError::PlanStale {
            planned: 2,
            current: 1
        }
    ));
    assert_eq!(store.count().expect("count"), 1);

    let fresh = manager.plan_purge().expect("replan");
    assert_eq!(manager.commit_purge(fresh).expect("commit").deleted, 1);
}

/// Writes of canonical records between plan and commit do not stale the plan.
#[test]
fn canonical_writes_do_not_stale_the_plan() {
    let (_temp, store) = open_temp_store();
    seed(&store, &[record("legacy", "Note", "old")]);
    let manager = MigrationManager::new(Arc::clone(&store));
    let plan = manager.plan_purge().expect("plan");
    store
        .put(&canonical_record("Note", "written meanwhile"))
        .expect("put");

    let outcome = manager.commit_purge(plan).expect("commit");
    assert_eq!(outcome.deleted, 1);
    assert_eq!(store.count().expect("count"), 1);
}

/// Aborting keeps every record.
#[test]
fn abort_keeps_records() {
    let (_temp, store) = open_temp_store();
    seed(&store, &[record("legacy", "Note", "old")]);
    let manager = MigrationManager::new(Arc::clone(&store));
    let plan = manager.plan_purge().expect("plan");
    assert_eq!(plan.candidates().len(), 1);

    let outcome = manager.abort_purge(plan);
    assert_eq!(outcome.state, PurgeState::Aborted);
    assert_eq!(store.count().expect("count"), 1);
}

fn id_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}",
        "[a-z]{1,8}/[a-z]{1,8}\\.rs",
        "[A-Z]:\\\\[a-z]{1,8}\\\\[a-z]{1,8}\\.py",
        "[0-9a-z-]{1,20}",
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Invalid ids are the complement of valid ids; purging keeps valid records intact.
    #[test]
    fn purge_removes_exactly_the_invalid_ids(ids in prop::collection::btree_set(id_strategy(), 0..20)) {
        let (_temp, store) = open_temp_store();
        let records: Vec<_> = ids
            .iter()
            .map(|id| record(id, "Note", &format!("body of {id}")))
            .collect();
        seed(&store, &records);
        let manager = MigrationManager::new(Arc::clone(&store));

        let valid: BTreeSet<String> = ids
            .iter()
            .filter(|id| classify(id) == IdentityClass::Valid)
            .cloned()
            .collect();
        let invalid = manager.find_invalid_ids().expect("invalid");
        prop_assert_eq!(
            &invalid,
            &ids.difference(&valid).cloned().collect::<BTreeSet<_>>()
        );

        let outcome = manager
            .commit_purge(manager.plan_purge().expect("plan"))
            .expect("commit");
        prop_assert_eq!(outcome.deleted, invalid.len());
        prop_assert!(manager.find_invalid_ids().expect("after").is_empty());
        for kept in records.iter().filter(|r| valid.contains(&r.id)) {
            prop_assert_eq!(&store.get(&kept.id).expect("kept"), kept);
        }
    }
}
