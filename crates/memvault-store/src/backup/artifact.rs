//! SQLite file format for snapshot artifacts.

use crate::error::StoreError;
use crate::model::{BackupMetadata, MemoryRecord};
use crate::schema::{self, BACKUP_METADATA_TABLE, MEMORIES_TABLE};
use crate::store::upsert_record;
use log::warn;
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, OpenFlags, Row};
use std::collections::BTreeMap;
use std::io;
use std::path::Path;

/// Write records and metadata into a new artifact at `path`.
pub(super) fn write(
    path: &Path,
    metadata: &BackupMetadata,
    records: &[MemoryRecord],
) -> Result<(), StoreError> {
    if path.exists() {
        return Err(StoreError::Io(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("snapshot artifact already exists: {}", path.display()),
        )));
    }
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut conn = Connection::open(path)?;
    schema::apply_snapshot_schema(&conn)?;
    let tx = conn.transaction()?;
    for record in records {
        upsert_record(&tx, record)?;
    }
    for (key, value) in &metadata.entries {
        tx.execute(
            "INSERT INTO backup_metadata (key, value) VALUES (?1, ?2)",
            [key, value],
        )?;
    }
    tx.commit()?;
    Ok(())
}

/// Read an artifact; the metadata table is optional.
pub(super) fn read(path: &Path) -> Result<(BackupMetadata, Vec<MemoryRecord>), StoreError> {
    if !path.exists() {
        return Err(StoreError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("snapshot artifact not found: {}", path.display()),
        )));
    }
    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
    if !schema::table_exists(&conn, MEMORIES_TABLE)? {
        return Err(StoreError::Corrupt(format!(
            "snapshot has no {MEMORIES_TABLE} table: {}",
            path.display()
        )));
    }
    let records = read_records(&conn, path)?;
    let entries = if schema::table_exists(&conn, BACKUP_METADATA_TABLE)? {
        read_metadata_rows(&conn)?
    } else {
        BTreeMap::new()
    };
    Ok((BackupMetadata::from_entries(entries), records))
}

/// Records in id order, then insertion order for repeated ids.
fn read_records(conn: &Connection, path: &Path) -> rusqlite::Result<Vec<MemoryRecord>> {
    let mut stmt =
        conn.prepare("SELECT id, scope, content, json_data FROM memories ORDER BY id, rowid")?;
    let rows = stmt.query_map([], |row| artifact_row_to_record(row, path))?;
    rows.collect()
}

/// Older artifacts have no NOT NULL constraints; NULL text columns read as
/// empty strings so the rest of the file can still be audited.
fn artifact_row_to_record(row: &Row<'_>, path: &Path) -> rusqlite::Result<MemoryRecord> {
    let id: Option<String> = row.get(0)?;
    let scope: Option<String> = row.get(1)?;
    let content: Option<String> = row.get(2)?;
    let json_data: Option<String> = row.get(3)?;
    if id.is_none() || scope.is_none() || content.is_none() {
        warn!(
            "snapshot row has NULL columns (path={}, id={:?}, scope_null={}, content_null={})",
            path.display(),
            id,
            scope.is_none(),
            content.is_none()
        );
    }
    Ok(MemoryRecord {
        id: id.unwrap_or_default(),
        scope: scope.unwrap_or_default(),
        content: content.unwrap_or_default(),
        structured_fields: json_data.filter(|raw| !raw.trim().is_empty()),
    })
}

fn read_metadata_rows(conn: &Connection) -> rusqlite::Result<BTreeMap<String, String>> {
    let mut stmt = conn.prepare("SELECT key, value FROM backup_metadata")?;
    let rows = stmt.query_map([], |row| {
        let key: String = row.get(0)?;
        let value: SqlValue = row.get(1)?;
        Ok((key, value_to_text(value)))
    })?;
    rows.collect()
}

/// Older artifacts store metadata values with mixed SQLite types.
fn value_to_text(value: SqlValue) -> String {
    match value {
        SqlValue::Null => String::new(),
        SqlValue::Integer(number) => number.to_string(),
        SqlValue::Real(number) => number.to_string(),
        SqlValue::Text(text) => text,
        SqlValue::Blob(bytes) => format!("<{} bytes>", bytes.len()),
    }
}
