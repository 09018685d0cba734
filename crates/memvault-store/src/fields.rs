//! Structured payload parsing.
//!
//! Payloads are JSON objects stored as opaque text next to a record. Parsing
//! never fails: anything that is not an object degrades to an empty mapping
//! flagged as malformed, so callers still see the record's scope and content.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::collections::BTreeMap;

/// Key of the document envelope some writers wrap their fields in.
pub const FIELDS_ENVELOPE_KEY: &str = "fields";

/// Typed field name to value mapping.
pub type FieldMap = BTreeMap<String, FieldValue>;

/// A single structured field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Text(String),
    Number(Number),
    Boolean(bool),
    Null,
    List(Vec<FieldValue>),
    Nested(FieldMap),
}

impl FieldValue {
    /// Short label for display.
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Text(_) => "text",
            FieldValue::Number(_) => "number",
            FieldValue::Boolean(_) => "boolean",
            FieldValue::Null => "null",
            FieldValue::List(_) => "list",
            FieldValue::Nested(_) => "nested",
        }
    }

    /// Convert back into an untyped JSON value.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Text(text) => Value::String(text.clone()),
            FieldValue::Number(number) => Value::Number(number.clone()),
            FieldValue::Boolean(flag) => Value::Bool(*flag),
            FieldValue::Null => Value::Null,
            FieldValue::List(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            FieldValue::Nested(map) => Value::Object(
                map.iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => FieldValue::Text(text),
            Value::Number(number) => FieldValue::Number(number),
            Value::Bool(flag) => FieldValue::Boolean(flag),
            Value::Null => FieldValue::Null,
            Value::Array(items) => FieldValue::List(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => FieldValue::Nested(
                map.into_iter()
                    .map(|(key, value)| (key, FieldValue::from(value)))
                    .collect(),
            ),
        }
    }
}

/// Whether the raw payload parsed as an object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldStatus {
    /// Object payload, or no payload at all.
    #[default]
    WellFormed,
    /// Payload was not JSON or not an object; fields were dropped.
    Malformed,
}

/// Result of parsing a structured payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedFields {
    pub fields: FieldMap,
    pub status: FieldStatus,
}

impl ParsedFields {
    fn malformed() -> Self {
        Self {
            fields: FieldMap::new(),
            status: FieldStatus::Malformed,
        }
    }

    /// True if the payload could not be used.
    pub fn is_malformed(&self) -> bool {
        self.status == FieldStatus::Malformed
    }

    /// Document fields, unwrapping the `fields` envelope when present.
    pub fn document_fields(&self) -> &FieldMap {
        match self.fields.get(FIELDS_ENVELOPE_KEY) {
            Some(FieldValue::Nested(inner)) => inner,
            _ => &self.fields,
        }
    }
}

/// Parse a raw payload into typed fields.
///
/// A blank payload is treated as "no fields" rather than malformed.
pub fn parse(raw: &str) -> ParsedFields {
    if raw.trim().is_empty() {
        return ParsedFields::default();
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => ParsedFields {
            fields: map
                .into_iter()
                .map(|(key, value)| (key, FieldValue::from(value)))
                .collect(),
            status: FieldStatus::WellFormed,
        },
        _ => ParsedFields::malformed(),
    }
}

/// Field names carried by a payload, in sorted order.
pub fn field_names(raw: &str) -> Vec<String> {
    parse(raw).document_fields().keys().cloned().collect()
}
