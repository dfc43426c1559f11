//! Identity-keyed merge of records and collections.
//!
//! The merge is last-write-wins at the field-group level: every field the
//! newer record carries replaces the older value, except sub-collection
//! fields, whose entries are unioned by their own key.

use serde_json::Value;
use std::collections::HashMap;

use super::collection::Collection;
use super::records_model::{Record, RecordKey, RecordSchema};

/// Combines two observations of the same record. `newer` wins on every
/// field it carries; fields it omits are kept from `older`.
pub fn merge_record(schema: &RecordSchema, older: &Record, newer: &Record) -> Record {
    let mut merged = older.clone();

    for (field, incoming) in newer.fields() {
        let combined = match (schema.sub_collection(field), incoming) {
            (Some(sub), Value::Array(entries)) => {
                let existing = match older.get(field) {
                    Some(Value::Array(existing)) => existing.as_slice(),
                    _ => &[],
                };
                Value::Array(union_entries(&sub.key, existing, entries))
            }
            _ => incoming.clone(),
        };
        merged.set(field.clone(), combined);
    }

    merged
}

/// Unions two entry lists by `key`. Entries from `newer` replace same-key
/// entries in place; unseen keys are appended in `newer` order. Entries
/// without a key are kept once.
///
/// Repeated keys within one list collapse the same way, so the output never
/// holds a key twice.
pub fn union_entries(key: &str, older: &[Value], newer: &[Value]) -> Vec<Value> {
    let mut out: Vec<Value> = Vec::with_capacity(older.len() + newer.len());
    let mut positions: HashMap<RecordKey, usize> = HashMap::new();

    for entry in older.iter().chain(newer) {
        match entry.get(key).and_then(RecordKey::from_value) {
            Some(entry_key) => match positions.get(&entry_key) {
                Some(&idx) => out[idx] = entry.clone(),
                None => {
                    positions.insert(entry_key, out.len());
                    out.push(entry.clone());
                }
            },
            None => {
                if !out.contains(entry) {
                    out.push(entry.clone());
                }
            }
        }
    }

    out
}

/// Merges two collections into a new one.
///
/// Every key of either side appears exactly once. Keys of `a` keep their
/// `a` order; keys only present in `b` follow in `b` order. On a shared key
/// `b` is treated as the more recently observed side. `merge(x, x) == x`.
pub fn merge(schema: &RecordSchema, a: &Collection, b: &Collection) -> Collection {
    let mut out = a.clone();
    for (key, record) in b.iter_keyed() {
        out.upsert_keyed(schema, key.clone(), record);
    }
    out
}

/// Record as stored in a collection: sub-collection entries unique by key.
pub(crate) fn normalize_record(schema: &RecordSchema, record: &Record) -> Record {
    if schema.sub_collections().is_empty() {
        return record.clone();
    }
    merge_record(schema, &Record::default(), record)
}
