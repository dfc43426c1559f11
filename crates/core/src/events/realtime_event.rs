//! Real-time event types.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::records::{Record, RecordSchema};

/// A kind of collection kept in sync with the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feed {
    /// Leave requests awaiting or past approval.
    Leave,
    /// Attendance/log entries.
    Attendance,
}

impl Feed {
    pub fn schema(&self) -> RecordSchema {
        match self {
            Feed::Leave => RecordSchema::leave_requests(),
            Feed::Attendance => RecordSchema::attendance_logs(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Feed::Leave => "leave",
            Feed::Attendance => "attendance",
        }
    }
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind tag of an inbound real-time message.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Handshake echo; carries no record.
    Greeting,
    /// A new leave request was filed.
    ApplyLeave,
    /// A leave request changed status.
    LeaveStatusUpdate,
    /// An attendance log was recorded or amended.
    AttendanceLog,
    /// Anything else the server sends. Ignored.
    Unknown(String),
}

impl EventKind {
    /// Parses the `type` tag of a frame, accepting the spellings the server
    /// has used over time.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "greeting" => EventKind::Greeting,
            "apply_leave" | "apply" => EventKind::ApplyLeave,
            "leave_status_update" | "status-update" | "status_update" | "update_leave_status" => {
                EventKind::LeaveStatusUpdate
            }
            "attendance_log" | "log" => EventKind::AttendanceLog,
            _ => EventKind::Unknown(raw.to_string()),
        }
    }

    /// Feed whose collection this kind of event updates.
    pub fn feed(&self) -> Option<Feed> {
        match self {
            EventKind::ApplyLeave | EventKind::LeaveStatusUpdate => Some(Feed::Leave),
            EventKind::AttendanceLog => Some(Feed::Attendance),
            EventKind::Greeting | EventKind::Unknown(_) => None,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, EventKind::Unknown(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            EventKind::Greeting => "greeting",
            EventKind::ApplyLeave => "apply_leave",
            EventKind::LeaveStatusUpdate => "leave_status_update",
            EventKind::AttendanceLog => "attendance_log",
            EventKind::Unknown(raw) => raw,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One inbound real-time message: a kind plus a (possibly partial) record.
#[derive(Debug, Clone, PartialEq)]
pub struct RealtimeEvent {
    pub kind: EventKind,
    pub data: Option<Record>,
}

impl RealtimeEvent {
    pub fn new(kind: EventKind, data: Option<Record>) -> Self {
        Self { kind, data }
    }

    /// Creates an ApplyLeave event.
    pub fn apply_leave(data: Record) -> Self {
        Self::new(EventKind::ApplyLeave, Some(data))
    }

    /// Creates a LeaveStatusUpdate event.
    pub fn leave_status_update(data: Record) -> Self {
        Self::new(EventKind::LeaveStatusUpdate, Some(data))
    }

    /// Creates an AttendanceLog event.
    pub fn attendance_log(data: Record) -> Self {
        Self::new(EventKind::AttendanceLog, Some(data))
    }

    pub fn greeting() -> Self {
        Self::new(EventKind::Greeting, None)
    }
}
