//! SQLite schema for the memory store and its snapshot artifacts.

use rusqlite::Connection;

/// Primary table holding memory records.
pub const MEMORIES_TABLE: &str = "memories";
/// Provenance table present only in snapshot artifacts.
pub const BACKUP_METADATA_TABLE: &str = "backup_metadata";

const CREATE_MEMORIES: &str = "CREATE TABLE IF NOT EXISTS memories (
    id TEXT PRIMARY KEY NOT NULL,
    scope TEXT NOT NULL,
    content TEXT NOT NULL,
    json_data TEXT
)";

const CREATE_MEMORIES_SCOPE_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_memories_scope ON memories(scope)";

const CREATE_BACKUP_METADATA: &str = "CREATE TABLE IF NOT EXISTS backup_metadata (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL
)";

/// Create the store tables if missing.
pub(crate) fn apply_store_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(CREATE_MEMORIES, [])?;
    conn.execute(CREATE_MEMORIES_SCOPE_INDEX, [])?;
    Ok(())
}

/// Create the tables of a snapshot artifact.
pub(crate) fn apply_snapshot_schema(conn: &Connection) -> rusqlite::Result<()> {
    apply_store_schema(conn)?;
    conn.execute(CREATE_BACKUP_METADATA, [])?;
    Ok(())
}

/// Whether a table exists in the connected database.
pub(crate) fn table_exists(conn: &Connection, table: &str) -> rusqlite::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [table],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Stored `CREATE TABLE` text for a table, if it exists.
pub(crate) fn table_sql(conn: &Connection, table: &str) -> rusqlite::Result<Option<String>> {
    let mut stmt =
        conn.prepare("SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?1")?;
    let mut rows = stmt.query([table])?;
    match rows.next()? {
        Some(row) => row.get(0),
        None => Ok(None),
    }
}
