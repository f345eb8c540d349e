use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Opaque child identifier as issued by the record-keeping API
pub type ChildId = i64;

/// Opaque class identifier as issued by the record-keeping API
pub type ClassId = String;

/// A child as returned by the roster endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Child {
    pub id: ChildId,
    /// Display name shown in the grid's first column
    pub name: String,
}

impl Child {
    pub fn new(id: ChildId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Attendance status for one child on one date
///
/// `Unrecorded` is an explicit member: a missing record on the wire is always
/// materialized as `Unrecorded` before it reaches the grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    #[default]
    Unrecorded,
    Present,
    Absent,
    Late,
}

impl AttendanceStatus {
    /// Lowercase wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Unrecorded => "unrecorded",
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Late => "late",
        }
    }

    pub fn is_recorded(&self) -> bool {
        !matches!(self, AttendanceStatus::Unrecorded)
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attendance record exactly as the remote API returns it.
///
/// Field names and casing are not consistent between endpoints (`childId` vs
/// `ChildId`, `date` vs `AttendanceDate`) and dates arrive either as a bare
/// calendar date or as a full timestamp. The backend's record normalizer is
/// the only place that looks inside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawAttendanceRecord(Value);

impl RawAttendanceRecord {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// The record's fields, if the payload is a JSON object at all
    pub fn as_object(&self) -> Option<&Map<String, Value>> {
        self.0.as_object()
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_inner(self) -> Value {
        self.0
    }
}

impl From<Value> for RawAttendanceRecord {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Attribution attached to every write (who performed the action).
///
/// The attendance engine passes this through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WriteMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recorded_by: Option<String>,
    /// Anything else the caller wants forwarded to the API
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WriteMetadata {
    pub fn recorded_by(name: impl Into<String>) -> Self {
        Self {
            recorded_by: Some(name.into()),
            extra: Map::new(),
        }
    }
}

/// Request to set the status of a single (child, date) cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteStatusRequest {
    pub child_id: ChildId,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub metadata: WriteMetadata,
}

/// Request to set the free-text notes of a single (child, date) cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteNotesRequest {
    pub child_id: ChildId,
    pub date: NaiveDate,
    /// `None` clears the notes
    pub notes: Option<String>,
    pub metadata: WriteMetadata,
}

/// Request to mark every unrecorded child in a class present on one date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkPresentRequest {
    pub class_id: ClassId,
    pub date: NaiveDate,
    /// Children the client computed as unrecorded. The server skips
    /// already-recorded children on its own as well.
    pub child_ids: Vec<ChildId>,
    pub metadata: WriteMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkPresentResponse {
    /// Number of records the server actually wrote
    pub marked_count: u32,
}
