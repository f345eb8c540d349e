use chrono::NaiveDate;
use serde::Serialize;
use shared::{AttendanceStatus, ChildId};

/// Canonical attendance record: one per (child, date) pair.
///
/// Produced only by the record normalizer or as a placeholder by the grid
/// assembler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttendanceRecord {
    pub child_id: ChildId,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub notes: Option<String>,
    /// Who recorded the status, when the API tells us
    pub recorded_by: Option<String>,
}

impl AttendanceRecord {
    /// Placeholder for a (child, date) pair with no record
    pub fn unrecorded(child_id: ChildId, date: NaiveDate) -> Self {
        Self {
            child_id,
            date,
            status: AttendanceStatus::Unrecorded,
            notes: None,
            recorded_by: None,
        }
    }

    pub fn with_status(mut self, status: AttendanceStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}
