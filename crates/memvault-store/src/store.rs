//! SQLite-backed document store for memory records.
//!
//! All mutations go through a single writer connection guarded by a mutex, so
//! no two writes interleave. Reads open their own read-only connection; with
//! the default WAL journal they run alongside the writer and each read
//! transaction sees one consistent version of the database.

use crate::error::StoreError;
use crate::identity::{self, IdentityReport};
use crate::model::MemoryRecord;
use crate::schema::{self, MEMORIES_TABLE};
use log::{debug, info, warn};
use parking_lot::Mutex;
use rusqlite::{Connection, OpenFlags, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

const SELECT_RECORD: &str = "SELECT id, scope, content, json_data FROM memories";

/// SQLite journal mode applied when the store is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JournalMode {
    #[default]
    Wal,
    Delete,
    Truncate,
    Memory,
}

impl JournalMode {
    fn as_pragma(self) -> &'static str {
        match self {
            JournalMode::Wal => "WAL",
            JournalMode::Delete => "DELETE",
            JournalMode::Truncate => "TRUNCATE",
            JournalMode::Memory => "MEMORY",
        }
    }
}

impl FromStr for JournalMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "wal" => Ok(JournalMode::Wal),
            "delete" => Ok(JournalMode::Delete),
            "truncate" => Ok(JournalMode::Truncate),
            "memory" => Ok(JournalMode::Memory),
            other => Err(format!("unknown journal mode: {other}")),
        }
    }
}

/// Connection settings for a store.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// How long a connection waits on a locked database.
    pub busy_timeout: Duration,
    /// Journal mode for the database file.
    pub journal_mode: JournalMode,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            busy_timeout: Duration::from_millis(5000),
            journal_mode: JournalMode::Wal,
        }
    }
}

/// Durable keyed storage of memory records.
pub struct MemoryStore {
    path: PathBuf,
    options: StoreOptions,
    writer: Mutex<Connection>,
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("path", &self.path)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl MemoryStore {
    /// Open (or create) a store at the given database path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::open_with_options(path, StoreOptions::default())
    }

    /// Open (or create) a store with explicit connection settings.
    pub fn open_with_options(
        path: impl AsRef<Path>,
        options: StoreOptions,
    ) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&path)?;
        conn.busy_timeout(options.busy_timeout)?;
        let mode: String = conn.query_row(
            &format!("PRAGMA journal_mode = {}", options.journal_mode.as_pragma()),
            [],
            |row| row.get(0),
        )?;
        conn.execute_batch("PRAGMA synchronous = FULL;")?;
        schema::apply_store_schema(&conn)?;
        info!(
            "opened memory store (path={}, journal_mode={})",
            path.display(),
            mode
        );
        Ok(Self {
            path,
            options,
            writer: Mutex::new(conn),
        })
    }

    /// Database file backing this store.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Insert or fully replace the record keyed by `record.id`.
    pub fn put(&self, record: &MemoryRecord) -> Result<(), StoreError> {
        if record.scope.trim().is_empty() {
            return Err(StoreError::EmptyScope(record.id.clone()));
        }
        if !identity::is_canonical(&record.id) {
            warn!("storing memory with legacy id (id={})", record.id);
        }
        if record.fields().is_malformed() {
            warn!(
                "storing memory with malformed structured fields (id={})",
                record.id
            );
        }
        let conn = self.writer.lock();
        upsert_record(&conn, record)?;
        debug!(
            "stored memory (id={}, scope={}, content_len={})",
            record.id,
            record.scope,
            record.content.len()
        );
        Ok(())
    }

    /// Fetch a record by id.
    pub fn get(&self, id: &str) -> Result<MemoryRecord, StoreError> {
        self.find(id)?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// Fetch a record by id, returning `None` when absent.
    pub fn find(&self, id: &str) -> Result<Option<MemoryRecord>, StoreError> {
        let conn = self.reader()?;
        let record = conn
            .query_row(&format!("{SELECT_RECORD} WHERE id = ?1"), [id], row_to_record)
            .optional()?;
        Ok(record)
    }

    /// Remove a record; returns whether anything was deleted.
    ///
    /// Deleting an absent id is a no-op.
    pub fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let conn = self.writer.lock();
        let removed = conn.execute("DELETE FROM memories WHERE id = ?1", [id])?;
        debug!("delete memory (id={}, removed={})", id, removed);
        Ok(removed > 0)
    }

    /// All records, or only those in `scope`, ordered by id.
    pub fn list(&self, scope: Option<&str>) -> Result<Vec<MemoryRecord>, StoreError> {
        let conn = self.reader()?;
        Ok(list_records(&conn, scope)?)
    }

    /// A bounded slice of `list`, for previews.
    pub fn list_page(
        &self,
        scope: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<MemoryRecord>, StoreError> {
        let conn = self.reader()?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);
        let records = match scope {
            Some(scope) => {
                let mut stmt = conn.prepare(&format!(
                    "{SELECT_RECORD} WHERE scope = ?1 ORDER BY id LIMIT ?2 OFFSET ?3"
                ))?;
                let rows =
                    stmt.query_map(rusqlite::params![scope, limit, offset], row_to_record)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
            None => {
                let mut stmt =
                    conn.prepare(&format!("{SELECT_RECORD} ORDER BY id LIMIT ?1 OFFSET ?2"))?;
                let rows = stmt.query_map(rusqlite::params![limit, offset], row_to_record)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
        };
        Ok(records)
    }

    /// Every stored identifier, ordered.
    pub fn ids(&self) -> Result<Vec<String>, StoreError> {
        let conn = self.reader()?;
        Ok(list_ids(&conn)?)
    }

    /// Total number of records.
    pub fn count(&self) -> Result<usize, StoreError> {
        let conn = self.reader()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM memories", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Record count per distinct scope.
    pub fn count_by_scope(&self) -> Result<BTreeMap<String, usize>, StoreError> {
        let conn = self.reader()?;
        Ok(scope_counts(&conn)?)
    }

    /// Canonical vs legacy identifier counts.
    pub fn identity_report(&self) -> Result<IdentityReport, StoreError> {
        Ok(IdentityReport::from_ids(self.ids()?))
    }

    /// `CREATE TABLE` text of the memories table.
    pub fn schema_sql(&self) -> Result<Option<String>, StoreError> {
        let conn = self.reader()?;
        Ok(schema::table_sql(&conn, MEMORIES_TABLE)?)
    }

    /// Run SQLite's quick integrity check.
    pub fn integrity_check(&self) -> Result<(), StoreError> {
        let conn = self.reader()?;
        let result: String = conn.query_row("PRAGMA quick_check", [], |row| row.get(0))?;
        if result == "ok" {
            Ok(())
        } else {
            warn!(
                "memory store failed integrity check (path={}, result={})",
                self.path.display(),
                result
            );
            Err(StoreError::Corrupt(result))
        }
    }

    /// Run `f` inside one write transaction on the single writer connection.
    ///
    /// The transaction commits when `f` succeeds and rolls back otherwise.
    pub(crate) fn with_write_transaction<T>(
        &self,
        f: impl FnOnce(&Transaction<'_>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut conn = self.writer.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Run `f` inside one read transaction on a fresh reader connection.
    pub(crate) fn with_read_transaction<T>(
        &self,
        f: impl FnOnce(&Transaction<'_>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut conn = self.reader()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Deferred)?;
        let value = f(&tx)?;
        tx.finish()?;
        Ok(value)
    }

    fn reader(&self) -> Result<Connection, StoreError> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(self.options.busy_timeout)?;
        Ok(conn)
    }
}

/// Insert or replace a record on the given connection.
pub(crate) fn upsert_record(conn: &Connection, record: &MemoryRecord) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO memories (id, scope, content, json_data) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(id) DO UPDATE SET
            scope = excluded.scope,
            content = excluded.content,
            json_data = excluded.json_data",
        rusqlite::params![
            &record.id,
            &record.scope,
            &record.content,
            &record.structured_fields
        ],
    )?;
    Ok(())
}

/// All records on the connection, optionally filtered by scope.
pub(crate) fn list_records(
    conn: &Connection,
    scope: Option<&str>,
) -> rusqlite::Result<Vec<MemoryRecord>> {
    match scope {
        Some(scope) => {
            let mut stmt = conn.prepare(&format!("{SELECT_RECORD} WHERE scope = ?1 ORDER BY id"))?;
            let rows = stmt.query_map([scope], row_to_record)?;
            rows.collect()
        }
        None => {
            let mut stmt = conn.prepare(&format!("{SELECT_RECORD} ORDER BY id"))?;
            let rows = stmt.query_map([], row_to_record)?;
            rows.collect()
        }
    }
}

/// All identifiers on the connection, ordered.
pub(crate) fn list_ids(conn: &Connection) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT id FROM memories ORDER BY id")?;
    let rows = stmt.query_map([], |row| row.get(0))?;
    rows.collect()
}

/// Per-scope counts on the connection.
pub(crate) fn scope_counts(conn: &Connection) -> rusqlite::Result<BTreeMap<String, usize>> {
    let mut stmt = conn.prepare("SELECT scope, COUNT(*) FROM memories GROUP BY scope")?;
    let rows = stmt.query_map([], |row| {
        let scope: String = row.get(0)?;
        let count: i64 = row.get(1)?;
        Ok((scope, usize::try_from(count).unwrap_or_default()))
    })?;
    rows.collect()
}

/// Map a `memories` row into a record; blank payloads read back as `None`.
pub(crate) fn row_to_record(row: &Row<'_>) -> rusqlite::Result<MemoryRecord> {
    let json_data: Option<String> = row.get(3)?;
    Ok(MemoryRecord {
        id: row.get(0)?,
        scope: row.get(1)?,
        content: row.get(2)?,
        structured_fields: json_data.filter(|raw| !raw.trim().is_empty()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn open_store(dir: &Path) -> MemoryStore {
        MemoryStore::open(dir.join("memories.db")).expect("open store")
    }

    #[test]
    fn put_then_get_round_trips() {
        let temp = tempdir().expect("tempdir");
        let store = open_store(temp.path());
        let record = MemoryRecord::new("Note", "remember the WAL").with_structured_fields(r#"{"a":1}"#);
        store.put(&record).expect("put");
        assert_eq!(store.get(&record.id).expect("get"), record);
    }

    #[test]
    fn put_replaces_without_merging() {
        let temp = tempdir().expect("tempdir");
        let store = open_store(temp.path());
        let first = MemoryRecord::with_id("x", "Note", "one").with_structured_fields(r#"{"a":1}"#);
        store.put(&first).expect("put first");
        let second = MemoryRecord::with_id("x", "ArchitecturalDecision", "two");
        store.put(&second).expect("put second");

        let stored = store.get("x").expect("get");
        assert_eq!(stored, second);
        assert_eq!(store.count().expect("count"), 1);
    }

    #[test]
    fn get_missing_is_not_found() {
        let temp = tempdir().expect("tempdir");
        let store = open_store(temp.path());
        let err = store.get("missing").unwrap_err();
        assert!(matches!(err, StoreError::NotFound(id) if id == "missing"));
    }

    #[test]
    fn empty_scope_is_rejected() {
        let temp = tempdir().expect("tempdir");
        let store = open_store(temp.path());
        let err = store.put(&MemoryRecord::new("  ", "x")).unwrap_err();
        assert!(matches!(err, StoreError::EmptyScope(_)));
        assert_eq!(store.count().expect("count"), 0);
    }

    #[test]
    fn delete_is_idempotent() {
        let temp = tempdir().expect("tempdir");
        let store = open_store(temp.path());
        let record = MemoryRecord::new("Note", "x");
        store.put(&record).expect("put");
        assert!(store.delete(&record.id).expect("delete"));
        assert!(!store.delete(&record.id).expect("delete again"));
        assert!(!store.delete("never-existed").expect("delete absent"));
        assert_eq!(store.count().expect("count"), 0);
    }

    #[test]
    fn list_filters_by_scope_in_id_order() {
        let temp = tempdir().expect("tempdir");
        let store = open_store(temp.path());
        for (id, scope) in [("c", "Note"), ("a", "Note"), ("b", "ArchitecturalDecision")] {
            store
                .put(&MemoryRecord::with_id(id, scope, "x"))
                .expect("put");
        }
        let all: Vec<String> = store
            .list(None)
            .expect("list")
            .into_iter()
            .map(|record| record.id)
            .collect();
        assert_eq!(all, vec!["a", "b", "c"]);
        let notes: Vec<String> = store
            .list(Some("Note"))
            .expect("list notes")
            .into_iter()
            .map(|record| record.id)
            .collect();
        assert_eq!(notes, vec!["a", "c"]);
        let page = store.list_page(None, 1, 1).expect("page");
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, "b");
    }

    #[test]
    fn count_by_scope_sums_to_total() {
        let temp = tempdir().expect("tempdir");
        let store = open_store(temp.path());
        for scope in ["Note", "Note", "ArchitecturalDecision"] {
            store.put(&MemoryRecord::new(scope, "x")).expect("put");
        }
        let counts = store.count_by_scope().expect("counts");
        assert_eq!(counts.get("Note"), Some(&2));
        assert_eq!(counts.get("ArchitecturalDecision"), Some(&1));
        assert_eq!(counts.values().sum::<usize>(), store.list(None).expect("list").len());
    }

    #[test]
    fn records_survive_reopen() {
        let temp = tempdir().expect("tempdir");
        let record = MemoryRecord::new("Note", "durable");
        {
            let store = open_store(temp.path());
            store.put(&record).expect("put");
        }
        let store = open_store(temp.path());
        assert_eq!(store.get(&record.id).expect("get"), record);
    }

    #[test]
    fn malformed_payload_is_stored_verbatim() {
        let temp = tempdir().expect("tempdir");
        let store = open_store(temp.path());
        let record = MemoryRecord::new("Note", "still readable").with_structured_fields("{not json");
        store.put(&record).expect("put");
        let stored = store.get(&record.id).expect("get");
        assert_eq!(stored.content, "still readable");
        assert!(stored.fields().is_malformed());
    }

    #[test]
    fn schema_and_integrity_are_inspectable() {
        let temp = tempdir().expect("tempdir");
        let store = open_store(temp.path());
        let sql = store.schema_sql().expect("schema").expect("memories table");
        assert!(sql.contains("json_data"));
        store.integrity_check().expect("integrity");
    }

    #[test]
    fn journal_mode_parses_case_insensitively() {
        assert_eq!("WAL".parse::<JournalMode>(), Ok(JournalMode::Wal));
        assert_eq!("truncate".parse::<JournalMode>(), Ok(JournalMode::Truncate));
        assert!("fast".parse::<JournalMode>().is_err());
    }
}
