use memvault_store::{MemoryRecord, MemoryStore};
use rusqlite::{Connection, params};
use std::path::Path;
use std::sync::Arc;
use tempfile::{TempDir, tempdir};

/// Open a store in a fresh temporary directory.
///
/// Keep the returned `TempDir` alive for as long as the store is used.
pub fn open_temp_store() -> (TempDir, Arc<MemoryStore>) {
    let temp = tempdir().expect("tempdir");
    let store = MemoryStore::open(temp.path().join("memories.db")).expect("open store");
    (temp, Arc::new(store))
}

pub fn seed(store: &MemoryStore, records: &[MemoryRecord]) {
    for record in records {
        store.put(record).expect("seed record");
    }
}

/// Write a snapshot file in the old layout: no primary key and no metadata
/// table, so identifiers may repeat.
pub fn write_legacy_artifact(path: &Path, records: &[MemoryRecord]) {
    let conn = Connection::open(path).expect("open legacy artifact");
    conn.execute_batch(
        "CREATE TABLE memories (id TEXT, scope TEXT, content TEXT, json_data TEXT)",
    )
    .expect("create legacy table");
    for record in records {
        conn.execute(
            "INSERT INTO memories (id, scope, content, json_data) VALUES (?1, ?2, ?3, ?4)",
            params![record.id, record.scope, record.content, record.structured_fields],
        )
        .expect("insert legacy row");
    }
}
