//! Ordered, identity-unique collection of records.

use log::warn;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;

use super::merge::{merge_record, normalize_record};
use super::records_model::{Record, RecordKey, RecordSchema};
use crate::errors::Result;

/// Records unique by identity key, in first-insertion order.
///
/// Updating an existing key merges in place and keeps its position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collection {
    keys: Vec<RecordKey>,
    records: Vec<Record>,
    positions: HashMap<RecordKey, usize>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a collection from raw records. Records without an identity are
    /// skipped with a warning; repeated keys are merged in order.
    pub fn from_records(schema: &RecordSchema, records: impl IntoIterator<Item = Record>) -> Self {
        let mut collection = Self::new();
        for record in records {
            if let Err(e) = collection.upsert(schema, record) {
                warn!("Skipping record without identity: {}", e);
            }
        }
        collection
    }

    /// Inserts `record` or merges it into the existing record with the same key.
    pub fn upsert(&mut self, schema: &RecordSchema, record: Record) -> Result<RecordKey> {
        let key = schema.require_key(&record)?;
        self.upsert_keyed(schema, key.clone(), &record);
        Ok(key)
    }

    pub(crate) fn upsert_keyed(&mut self, schema: &RecordSchema, key: RecordKey, record: &Record) {
        match self.positions.get(&key) {
            Some(&idx) => {
                let merged = merge_record(schema, &self.records[idx], record);
                self.records[idx] = merged;
            }
            None => {
                self.positions.insert(key.clone(), self.records.len());
                self.keys.push(key);
                self.records.push(normalize_record(schema, record));
            }
        }
    }

    /// Keeps only the records for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&RecordKey, &Record) -> bool) {
        let keys = std::mem::take(&mut self.keys);
        let records = std::mem::take(&mut self.records);
        self.positions.clear();

        for (key, record) in keys.into_iter().zip(records) {
            if keep(&key, &record) {
                self.positions.insert(key.clone(), self.records.len());
                self.keys.push(key);
                self.records.push(record);
            }
        }
    }

    pub fn get(&self, key: &RecordKey) -> Option<&Record> {
        self.positions.get(key).map(|&idx| &self.records[idx])
    }

    pub fn contains_key(&self, key: &RecordKey) -> bool {
        self.positions.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn keys(&self) -> &[RecordKey] {
        &self.keys
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    pub fn iter_keyed(&self) -> impl Iterator<Item = (&RecordKey, &Record)> {
        self.keys.iter().zip(self.records.iter())
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    /// Records re-sorted by `field` for display (e.g. a timestamp). Records
    /// missing the field sort last; ties keep collection order.
    pub fn sorted_by_field(&self, field: &str, descending: bool) -> Vec<Record> {
        let mut sorted = self.records.clone();
        sorted.sort_by(|a, b| match (a.get(field), b.get(field)) {
            (Some(x), Some(y)) => {
                let ord = compare_values(x, y);
                if descending {
                    ord.reverse()
                } else {
                    ord
                }
            }
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        sorted
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}
