//! Property-based integration tests for the identity-keyed merge.
//!
//! These tests check that collection merges keep identities unique, are
//! idempotent, and never duplicate attendance entries, using `proptest`
//! for random input generation.

use hrdesk_core::records::{merge, Collection, Record, RecordKey, RecordSchema};
use proptest::prelude::*;
use serde_json::{json, Value};
use std::collections::HashSet;

// =============================================================================
// Generators
// =============================================================================

fn arb_status() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("Pending"), Just("Approved"), Just("Rejected")]
}

/// Leave request with a reference number drawn from a small pool so that
/// collections overlap.
fn arb_leave_request() -> impl Strategy<Value = Record> {
    (0u32..12, arb_status(), "[a-z]{3,10}", 1u32..10).prop_map(|(reference, status, name, days)| {
        Record::from_value(json!({
            "reference_no": format!("LR-{reference:03}"),
            "status": status,
            "employee_name": name,
            "days": days,
        }))
        .unwrap()
    })
}

fn arb_leave_collection() -> impl Strategy<Value = Collection> {
    proptest::collection::vec(arb_leave_request(), 0..20)
        .prop_map(|records| Collection::from_records(&RecordSchema::leave_requests(), records))
}

/// Attendance log whose entries carry distinct ids.
fn arb_attendance_log() -> impl Strategy<Value = Record> {
    (
        0u32..6,
        proptest::collection::hash_set(0u32..30, 0..6),
        "[a-z]{3,8}",
    )
        .prop_map(|(log_id, entry_ids, device)| {
            let entries: Vec<Value> = entry_ids
                .into_iter()
                .map(|id| json!({ "id": id, "device": device }))
                .collect();
            Record::from_value(json!({ "id": log_id, "attendance": entries })).unwrap()
        })
}

fn arb_attendance_collection() -> impl Strategy<Value = Collection> {
    proptest::collection::vec(arb_attendance_log(), 0..10)
        .prop_map(|records| Collection::from_records(&RecordSchema::attendance_logs(), records))
}

/// Attendance log as a server may send it: entry ids can repeat.
fn arb_attendance_log_with_repeats() -> impl Strategy<Value = Record> {
    (
        0u32..4,
        proptest::collection::vec((0u32..4, "[0-9]{2}:[0-9]{2}"), 0..6),
    )
        .prop_map(|(log_id, entries)| {
            let entries: Vec<Value> = entries
                .into_iter()
                .map(|(id, clock_in)| json!({ "id": id, "in": clock_in }))
                .collect();
            Record::from_value(json!({ "id": log_id, "attendance": entries })).unwrap()
        })
}

fn key_set(collection: &Collection) -> HashSet<RecordKey> {
    collection.keys().iter().cloned().collect()
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// The merged collection holds exactly the union of both key sets.
    #[test]
    fn merged_count_equals_key_union(a in arb_leave_collection(), b in arb_leave_collection()) {
        let schema = RecordSchema::leave_requests();
        let merged = merge(&schema, &a, &b);

        let expected: HashSet<RecordKey> = key_set(&a).union(&key_set(&b)).cloned().collect();
        prop_assert_eq!(merged.len(), expected.len());
        prop_assert_eq!(key_set(&merged), expected);
    }

    /// Merging a collection with itself changes nothing.
    #[test]
    fn merge_is_idempotent(x in arb_leave_collection()) {
        let schema = RecordSchema::leave_requests();
        prop_assert_eq!(merge(&schema, &x, &x), x);
    }

    /// Idempotence holds for attendance logs even when the input repeats
    /// entry ids.
    #[test]
    fn attendance_merge_is_idempotent(
        records in proptest::collection::vec(arb_attendance_log_with_repeats(), 0..8),
    ) {
        let schema = RecordSchema::attendance_logs();
        let x = Collection::from_records(&schema, records);
        prop_assert_eq!(merge(&schema, &x, &x), x);
    }

    /// Keys of the first operand keep their relative order.
    #[test]
    fn merge_preserves_first_operand_order(a in arb_leave_collection(), b in arb_leave_collection()) {
        let schema = RecordSchema::leave_requests();
        let merged = merge(&schema, &a, &b);
        prop_assert_eq!(&merged.keys()[..a.len()], a.keys());
    }

    /// Shared keys take every field the second operand carries.
    #[test]
    fn second_operand_wins_on_shared_keys(a in arb_leave_collection(), b in arb_leave_collection()) {
        let schema = RecordSchema::leave_requests();
        let merged = merge(&schema, &a, &b);

        for (key, newer) in b.iter_keyed() {
            let record = merged.get(key).unwrap();
            for (field, value) in newer.fields() {
                prop_assert_eq!(record.get(field), Some(value));
            }
        }
    }

    /// Attendance entries are unioned by id without duplicates.
    #[test]
    fn attendance_entries_never_duplicate(
        a in arb_attendance_collection(),
        b in arb_attendance_collection(),
    ) {
        let schema = RecordSchema::attendance_logs();
        let merged = merge(&schema, &a, &b);

        for (key, record) in merged.iter_keyed() {
            let entries = record
                .get("attendance")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            let ids: Vec<u64> = entries.iter().filter_map(|e| e["id"].as_u64()).collect();
            let unique: HashSet<u64> = ids.iter().copied().collect();
            prop_assert_eq!(ids.len(), unique.len());

            let expected: HashSet<u64> = [a.get(key), b.get(key)]
                .into_iter()
                .flatten()
                .filter_map(|r| r.get("attendance").and_then(Value::as_array))
                .flatten()
                .filter_map(|e| e["id"].as_u64())
                .collect();
            prop_assert_eq!(unique, expected);
        }
    }
}
