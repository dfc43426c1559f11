//! Record, identity key and schema types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::errors::{Error, Result};

/// Identity field of leave requests.
pub const LEAVE_IDENTITY_FIELD: &str = "reference_no";

/// Identity field of attendance logs and of their attendance entries.
pub const ATTENDANCE_IDENTITY_FIELD: &str = "id";

/// Sub-collection field carried by attendance logs.
pub const ATTENDANCE_ENTRIES_FIELD: &str = "attendance";

/// Flat field name to JSON value mapping.
pub type Fields = Map<String, Value>;

/// One domain entity (leave request or attendance log).
///
/// Records are kept schemaless: fields the client does not know about are
/// carried through untouched so that a later merge never drops them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: Fields,
}

impl Record {
    pub fn new(fields: Fields) -> Self {
        Self { fields }
    }

    /// Builds a record from a JSON value, which must be an object.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(Error::invalid_record(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn into_fields(self) -> Fields {
        self.fields
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// String value of a field; `None` when absent or not a string.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Builder-style `set`.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}

impl From<Fields> for Record {
    fn from(fields: Fields) -> Self {
        Self::new(fields)
    }
}

/// Normalized identity of a record or sub-collection entry.
///
/// Scalars are rendered to their JSON text so that `1` and `"1"` name the
/// same record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordKey(String);

impl RecordKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Extracts a key from an identity value. Null, arrays, objects and
    /// empty strings are not identities.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.is_empty() => Some(Self(s.clone())),
            Value::Number(n) => Some(Self(n.to_string())),
            Value::Bool(b) => Some(Self(b.to_string())),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RecordKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// An array-valued field whose entries carry their own identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubCollection {
    pub field: String,
    pub key: String,
}

/// Describes how records of one feed are identified and merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSchema {
    identity: String,
    sub_collections: Vec<SubCollection>,
}

impl RecordSchema {
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            sub_collections: Vec::new(),
        }
    }

    /// Declares `field` as a sub-collection whose entries are keyed by `key`.
    pub fn with_sub_collection(mut self, field: impl Into<String>, key: impl Into<String>) -> Self {
        self.sub_collections.push(SubCollection {
            field: field.into(),
            key: key.into(),
        });
        self
    }

    /// Leave requests, keyed by reference number.
    pub fn leave_requests() -> Self {
        Self::new(LEAVE_IDENTITY_FIELD)
    }

    /// Attendance logs, keyed by id, with attendance entries keyed by id.
    pub fn attendance_logs() -> Self {
        Self::new(ATTENDANCE_IDENTITY_FIELD)
            .with_sub_collection(ATTENDANCE_ENTRIES_FIELD, ATTENDANCE_IDENTITY_FIELD)
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn sub_collections(&self) -> &[SubCollection] {
        &self.sub_collections
    }

    pub fn sub_collection(&self, field: &str) -> Option<&SubCollection> {
        self.sub_collections.iter().find(|s| s.field == field)
    }

    /// Identity key of `record`, if it has a usable one.
    pub fn key_of(&self, record: &Record) -> Option<RecordKey> {
        record.get(&self.identity).and_then(RecordKey::from_value)
    }

    /// Like [`key_of`](Self::key_of) but reports a missing identity as an error.
    pub fn require_key(&self, record: &Record) -> Result<RecordKey> {
        self.key_of(record).ok_or_else(|| {
            Error::invalid_record(format!("missing identity field '{}'", self.identity))
        })
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
