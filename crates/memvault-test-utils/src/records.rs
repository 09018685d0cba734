use memvault_store::MemoryRecord;

/// Record under an explicit, possibly legacy, identifier.
pub fn record(id: &str, scope: &str, content: &str) -> MemoryRecord {
    MemoryRecord::with_id(id, scope, content)
}

/// Record with a freshly minted canonical identifier.
pub fn canonical_record(scope: &str, content: &str) -> MemoryRecord {
    MemoryRecord::new(scope, content)
}

pub fn with_fields(id: &str, scope: &str, content: &str, raw: &str) -> MemoryRecord {
    MemoryRecord::with_id(id, scope, content).with_structured_fields(raw)
}
