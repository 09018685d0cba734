//! Read-only per-scope view over a memory store.

use crate::error::StoreError;
use crate::model::MemoryRecord;
use crate::store::MemoryStore;
use std::collections::{BTreeMap, BTreeSet};

/// Scope reporting derived from the store on every call.
#[derive(Debug, Clone, Copy)]
pub struct ScopeRegistry<'a> {
    store: &'a MemoryStore,
}

impl<'a> ScopeRegistry<'a> {
    pub fn new(store: &'a MemoryStore) -> Self {
        Self { store }
    }

    /// Record count per scope.
    pub fn counts(&self) -> Result<BTreeMap<String, usize>, StoreError> {
        self.store.count_by_scope()
    }

    /// Distinct scopes currently in use.
    pub fn scopes(&self) -> Result<BTreeSet<String>, StoreError> {
        Ok(self.counts()?.into_keys().collect())
    }

    /// Records filed under one scope.
    pub fn records(&self, scope: &str) -> Result<Vec<MemoryRecord>, StoreError> {
        self.store.list(Some(scope))
    }
}
