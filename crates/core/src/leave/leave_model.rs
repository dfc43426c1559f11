//! Typed views over leave and attendance records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{Error, Result};
use crate::records::{
    Record, RecordKey, RecordSchema, ATTENDANCE_ENTRIES_FIELD, ATTENDANCE_IDENTITY_FIELD,
};

pub const STATUS_FIELD: &str = "status";
pub const MANAGER_STATUS_FIELD: &str = "manager_status";
pub const REMARKS_FIELD: &str = "remarks";
pub const UPDATED_BY_FIELD: &str = "updated_by";

/// Status of a leave request.
///
/// `Pending` moves to `Approved` or `Rejected`; both are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

impl LeaveStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LeaveStatus::Approved | LeaveStatus::Rejected)
    }

    pub fn can_transition_to(&self, next: LeaveStatus) -> bool {
        matches!(
            (self, next),
            (LeaveStatus::Pending, LeaveStatus::Approved)
                | (LeaveStatus::Pending, LeaveStatus::Rejected)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LeaveStatus::Pending => "Pending",
            LeaveStatus::Approved => "Approved",
            LeaveStatus::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for LeaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeaveStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(LeaveStatus::Pending),
            "approved" => Ok(LeaveStatus::Approved),
            "rejected" => Ok(LeaveStatus::Rejected),
            other => Err(Error::InvalidStatus(other.to_string())),
        }
    }
}

/// Read-only projection of a leave request record.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaveRequestView {
    pub key: RecordKey,
    pub employee_id: Option<String>,
    pub leave_type: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub status: LeaveStatus,
    /// Manager-level approval sub-status.
    pub manager_status: Option<LeaveStatus>,
    pub remarks: Option<String>,
}

impl LeaveRequestView {
    pub fn from_record(schema: &RecordSchema, record: &Record) -> Result<Self> {
        let key = schema.require_key(record)?;
        let status = record
            .get_str(STATUS_FIELD)
            .ok_or_else(|| Error::invalid_record(format!("leave {} has no status", key)))?
            .parse::<LeaveStatus>()?;
        let manager_status = match record.get_str(MANAGER_STATUS_FIELD) {
            Some(raw) => Some(raw.parse::<LeaveStatus>()?),
            None => None,
        };

        Ok(Self {
            key,
            employee_id: scalar_text(record, "employee_id"),
            leave_type: record.get_str("leave_type").map(str::to_string),
            date_from: parse_date(record.get_str("date_from")),
            date_to: parse_date(record.get_str("date_to")),
            status,
            manager_status,
            remarks: record.get_str(REMARKS_FIELD).map(str::to_string),
        })
    }

    /// Whether approve/reject actions should be offered.
    ///
    /// Display-layer gate: the request must still be pending and the manager
    /// must have approved it. The merge store never enforces this.
    pub fn terminal_actions_permitted(&self) -> bool {
        self.status == LeaveStatus::Pending && self.manager_status == Some(LeaveStatus::Approved)
    }

    /// Inclusive number of days covered, when both dates are known.
    pub fn duration_days(&self) -> Option<i64> {
        match (self.date_from, self.date_to) {
            (Some(from), Some(to)) if to >= from => Some((to - from).num_days() + 1),
            _ => None,
        }
    }
}

/// Read-only projection of an attendance log record.
#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceLogView {
    pub key: RecordKey,
    pub employee_id: Option<String>,
    pub log_date: Option<NaiveDate>,
    pub entry_keys: Vec<RecordKey>,
}

impl AttendanceLogView {
    pub fn from_record(schema: &RecordSchema, record: &Record) -> Result<Self> {
        let key = schema.require_key(record)?;
        let entry_keys = record
            .get(ATTENDANCE_ENTRIES_FIELD)
            .and_then(|v| v.as_array())
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|e| e.get(ATTENDANCE_IDENTITY_FIELD))
                    .filter_map(RecordKey::from_value)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            key,
            employee_id: scalar_text(record, "employee_id"),
            log_date: parse_date(record.get_str("log_date")),
            entry_keys,
        })
    }
}

fn scalar_text(record: &Record, field: &str) -> Option<String> {
    record
        .get(field)
        .and_then(RecordKey::from_value)
        .map(|k| k.as_str().to_string())
}

// Accepts plain dates and RFC 3339 timestamps.
fn parse_date(raw: Option<&str>) -> Option<NaiveDate> {
    let raw = raw?;
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            chrono::DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.date_naive())
        })
}
