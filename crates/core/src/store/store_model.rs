use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::events::Feed;
use crate::leave::{LeaveStatus, REMARKS_FIELD, STATUS_FIELD, UPDATED_BY_FIELD};
use crate::records::{Fields, RecordKey};

/// Query parameters of a pull (filters, paging, date range).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullParams {
    params: BTreeMap<String, String>,
}

impl PullParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Key/value pairs in stable order, ready for query encoding.
    pub fn pairs(&self) -> Vec<(&str, &str)> {
        self.params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }
}

/// Remote action path segment implied by a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusAction {
    Approve,
    Reject,
    ChangeStatus,
}

impl StatusAction {
    pub fn as_path_segment(&self) -> &'static str {
        match self {
            StatusAction::Approve => "approve",
            StatusAction::Reject => "reject",
            StatusAction::ChangeStatus => "change-status",
        }
    }
}

/// A status mutation on one record: the new status plus auxiliary fields
/// (remarks, effective dates, role-specific fields).
///
/// Serializes to the body of the status-update request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChange {
    pub status: LeaveStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    pub updated_by: String,
    #[serde(flatten)]
    pub extra: Fields,
}

impl StatusChange {
    pub fn new(status: LeaveStatus, updated_by: impl Into<String>) -> Self {
        Self {
            status,
            remarks: None,
            updated_by: updated_by.into(),
            extra: Fields::new(),
        }
    }

    pub fn with_remarks(mut self, remarks: impl Into<String>) -> Self {
        self.remarks = Some(remarks.into());
        self
    }

    /// Adds an auxiliary field such as `effective_date`.
    pub fn with_field(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(field.into(), value.into());
        self
    }

    pub fn action(&self) -> StatusAction {
        match self.status {
            LeaveStatus::Approved => StatusAction::Approve,
            LeaveStatus::Rejected => StatusAction::Reject,
            LeaveStatus::Pending => StatusAction::ChangeStatus,
        }
    }

    /// Fields written onto the local record by the optimistic update.
    pub fn patch_fields(&self) -> Fields {
        let mut fields = self.extra.clone();
        fields.insert(STATUS_FIELD.to_string(), Value::from(self.status.as_str()));
        if let Some(remarks) = &self.remarks {
            fields.insert(REMARKS_FIELD.to_string(), Value::from(remarks.as_str()));
        }
        fields.insert(
            UPDATED_BY_FIELD.to_string(),
            Value::from(self.updated_by.as_str()),
        );
        fields
    }
}

/// What caused a collection change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeSource {
    Pull,
    Push,
    Optimistic,
}

/// Notification published after every mutation of a store's collection.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreChange {
    pub feed: Feed,
    pub source: ChangeSource,
    /// Keys touched by the change; for a pull, every visible key.
    pub keys: Vec<RecordKey>,
    /// Size of the visible collection after the change.
    pub total: usize,
}
