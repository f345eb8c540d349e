//! Record normalization.
//!
//! The record-keeping API is not consistent about field names (`childId` on
//! one endpoint, `ChildId` on another) or date encoding (`2025-06-10` vs
//! `2025-06-10T00:00:00`). This module is the only code that reads
//! `RawAttendanceRecord`; everything past it works with `AttendanceRecord`.
//!
//! A record that cannot be placed in the grid (no usable child id or date)
//! is skipped and reported as a `DataQualityWarning`. One bad record never
//! aborts the batch.

use chrono::NaiveDate;
use serde_json::{Map, Value};
use shared::{AttendanceStatus, ChildId, RawAttendanceRecord};
use tracing::{debug, warn};

use super::models::attendance_record::AttendanceRecord;

/// Accepted names for each field, canonical name first
pub const CHILD_ID_FIELDS: &[&str] = &["childId", "ChildId", "child_id", "childID"];
pub const DATE_FIELDS: &[&str] = &[
    "date",
    "Date",
    "attendanceDate",
    "AttendanceDate",
    "attendance_date",
];
pub const STATUS_FIELDS: &[&str] = &["status", "Status"];
pub const NOTES_FIELDS: &[&str] = &["notes", "Notes"];
pub const RECORDED_BY_FIELDS: &[&str] = &["recordedBy", "RecordedBy", "recorded_by"];

/// Why a raw record was skipped
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DataQualityWarning {
    #[error("Record is not an object: {0}")]
    NotAnObject(String),
    #[error("Record has no child identifier")]
    MissingChildId,
    #[error("Record has an unusable child identifier: {0}")]
    InvalidChildId(String),
    #[error("Record for child {0} has no date")]
    MissingDate(ChildId),
    #[error("Record for child {child_id} has an unusable date: {value}")]
    InvalidDate { child_id: ChildId, value: String },
    #[error("Record for child {child_id} on {date} has unknown status {value:?}")]
    UnknownStatus {
        child_id: ChildId,
        date: NaiveDate,
        value: String,
    },
}

/// A raw record that did not make it into the batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    /// Position of the record in the fetched list
    pub index: usize,
    pub reason: DataQualityWarning,
}

/// Result of normalizing a fetched list of raw records
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedBatch {
    pub records: Vec<AttendanceRecord>,
    pub skipped: Vec<SkippedRecord>,
}

impl NormalizedBatch {
    pub fn warnings(&self) -> impl Iterator<Item = &DataQualityWarning> {
        self.skipped.iter().map(|skipped| &skipped.reason)
    }
}

pub struct RecordNormalizer;

impl RecordNormalizer {
    /// Convert one raw record into the canonical shape
    pub fn normalize(raw: &RawAttendanceRecord) -> Result<AttendanceRecord, DataQualityWarning> {
        let fields = raw
            .as_object()
            .ok_or_else(|| DataQualityWarning::NotAnObject(raw.as_value().to_string()))?;

        let child_id = match lookup(fields, CHILD_ID_FIELDS) {
            Some(value) => parse_child_id(value)?,
            None => return Err(DataQualityWarning::MissingChildId),
        };

        let date = match lookup(fields, DATE_FIELDS) {
            Some(Value::String(value)) => {
                parse_calendar_date(value).ok_or_else(|| DataQualityWarning::InvalidDate {
                    child_id,
                    value: value.clone(),
                })?
            }
            Some(other) => {
                return Err(DataQualityWarning::InvalidDate {
                    child_id,
                    value: other.to_string(),
                })
            }
            None => return Err(DataQualityWarning::MissingDate(child_id)),
        };

        let status = match lookup(fields, STATUS_FIELDS) {
            None => AttendanceStatus::Unrecorded,
            Some(Value::String(value)) => {
                parse_status(value).ok_or_else(|| DataQualityWarning::UnknownStatus {
                    child_id,
                    date,
                    value: value.clone(),
                })?
            }
            Some(other) => {
                return Err(DataQualityWarning::UnknownStatus {
                    child_id,
                    date,
                    value: other.to_string(),
                })
            }
        };

        Ok(AttendanceRecord {
            child_id,
            date,
            status,
            notes: lookup_text(fields, NOTES_FIELDS),
            recorded_by: lookup_text(fields, RECORDED_BY_FIELDS),
        })
    }

    /// Normalize a fetched list, collecting skipped records instead of failing
    pub fn normalize_all(raws: &[RawAttendanceRecord]) -> NormalizedBatch {
        let mut batch = NormalizedBatch::default();

        for (index, raw) in raws.iter().enumerate() {
            match Self::normalize(raw) {
                Ok(record) => batch.records.push(record),
                Err(reason) => {
                    warn!("⚠️ Skipping attendance record #{}: {}", index, reason);
                    batch.skipped.push(SkippedRecord { index, reason });
                }
            }
        }

        debug!(
            "Normalized {} attendance records ({} skipped)",
            batch.records.len(),
            batch.skipped.len()
        );

        batch
    }
}

/// First non-null value among `names`, in preference order
fn lookup<'a>(fields: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .filter_map(|name| fields.get(*name))
        .find(|value| !value.is_null())
}

/// Optional free text; blank strings count as absent
fn lookup_text(fields: &Map<String, Value>, names: &[&str]) -> Option<String> {
    lookup(fields, names)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

fn parse_child_id(value: &Value) -> Result<ChildId, DataQualityWarning> {
    let parsed = match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse::<ChildId>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| DataQualityWarning::InvalidChildId(value.to_string()))
}

/// Calendar date of a `YYYY-MM-DD` value, ignoring any time-of-day suffix.
///
/// `2025-06-10T23:30:00-04:00` is June 10th: the date component is taken as
/// written, never shifted into another time zone.
pub fn parse_calendar_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    let date_part = trimmed
        .split(|c: char| c == 'T' || c == 't' || c == ' ')
        .next()
        .unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// Case-insensitive status name; blank means unrecorded
pub fn parse_status(value: &str) -> Option<AttendanceStatus> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "unrecorded" => Some(AttendanceStatus::Unrecorded),
        "present" => Some(AttendanceStatus::Present),
        "absent" => Some(AttendanceStatus::Absent),
        "late" => Some(AttendanceStatus::Late),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawAttendanceRecord {
        RawAttendanceRecord::new(value)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_capitalized_fields_with_timestamp() {
        let record = RecordNormalizer::normalize(&raw(json!({
            "ChildId": 7,
            "AttendanceDate": "2025-06-10T00:00:00",
            "Status": "present"
        })))
        .unwrap();

        assert_eq!(record.child_id, 7);
        assert_eq!(record.date, date(2025, 6, 10));
        assert_eq!(record.status, AttendanceStatus::Present);
        assert_eq!(record.notes, None);
    }

    #[test]
    fn test_canonical_name_wins_over_alternate() {
        let record = RecordNormalizer::normalize(&raw(json!({
            "childId": 3,
            "ChildId": 99,
            "date": "2025-06-09",
            "Date": "2025-01-01",
            "status": "late",
            "Status": "absent"
        })))
        .unwrap();

        assert_eq!(record.child_id, 3);
        assert_eq!(record.date, date(2025, 6, 9));
        assert_eq!(record.status, AttendanceStatus::Late);
    }

    #[test]
    fn test_null_canonical_falls_back_to_alternate() {
        let record = RecordNormalizer::normalize(&raw(json!({
            "childId": null,
            "ChildId": "12",
            "date": "2025-06-09"
        })))
        .unwrap();

        assert_eq!(record.child_id, 12);
    }

    #[test]
    fn test_missing_status_is_unrecorded() {
        let record =
            RecordNormalizer::normalize(&raw(json!({ "childId": 1, "date": "2025-06-10" })))
                .unwrap();
        assert_eq!(record.status, AttendanceStatus::Unrecorded);

        let record = RecordNormalizer::normalize(&raw(json!({
            "childId": 1, "date": "2025-06-10", "status": null
        })))
        .unwrap();
        assert_eq!(record.status, AttendanceStatus::Unrecorded);
    }

    #[test]
    fn test_status_is_case_insensitive() {
        for (input, expected) in [
            ("PRESENT", AttendanceStatus::Present),
            ("Absent", AttendanceStatus::Absent),
            (" late ", AttendanceStatus::Late),
            ("", AttendanceStatus::Unrecorded),
        ] {
            assert_eq!(parse_status(input), Some(expected), "input {:?}", input);
        }
        assert_eq!(parse_status("excused"), None);
    }

    #[test]
    fn test_timestamp_keeps_written_date() {
        assert_eq!(
            parse_calendar_date("2025-06-10T23:30:00-04:00"),
            Some(date(2025, 6, 10))
        );
        assert_eq!(
            parse_calendar_date("2025-06-10 08:15:00"),
            Some(date(2025, 6, 10))
        );
        assert_eq!(parse_calendar_date("2025-06-10Z"), None);
        assert_eq!(parse_calendar_date("yesterday"), None);
    }

    #[test]
    fn test_notes_and_recorder_are_carried() {
        let record = RecordNormalizer::normalize(&raw(json!({
            "childId": 4,
            "date": "2025-06-10",
            "status": "absent",
            "Notes": "  dentist  ",
            "RecordedBy": "Ms. Rivera"
        })))
        .unwrap();

        assert_eq!(record.notes.as_deref(), Some("dentist"));
        assert_eq!(record.recorded_by.as_deref(), Some("Ms. Rivera"));
    }

    #[test]
    fn test_unresolvable_records_are_reported() {
        assert_eq!(
            RecordNormalizer::normalize(&raw(json!({ "date": "2025-06-10" }))),
            Err(DataQualityWarning::MissingChildId)
        );
        assert!(matches!(
            RecordNormalizer::normalize(&raw(json!({ "childId": "abc", "date": "2025-06-10" }))),
            Err(DataQualityWarning::InvalidChildId(_))
        ));
        assert_eq!(
            RecordNormalizer::normalize(&raw(json!({ "childId": 5 }))),
            Err(DataQualityWarning::MissingDate(5))
        );
        assert!(matches!(
            RecordNormalizer::normalize(&raw(json!({ "childId": 5, "date": 20250610 }))),
            Err(DataQualityWarning::InvalidDate { child_id: 5, .. })
        ));
        assert!(matches!(
            RecordNormalizer::normalize(&raw(json!({
                "childId": 5, "date": "2025-06-10", "status": "excused"
            }))),
            Err(DataQualityWarning::UnknownStatus { child_id: 5, .. })
        ));
        assert!(matches!(
            RecordNormalizer::normalize(&raw(json!([1, 2, 3]))),
            Err(DataQualityWarning::NotAnObject(_))
        ));
    }

    #[test]
    fn test_bad_record_does_not_abort_batch() {
        let raws = vec![
            raw(json!({ "childId": 1, "date": "2025-06-10", "status": "present" })),
            raw(json!({ "name": "no id here", "date": "2025-06-10" })),
            raw(json!({ "ChildId": 2, "Date": "2025-06-09T00:00:00", "Status": "ABSENT" })),
        ];

        let batch = RecordNormalizer::normalize_all(&raws);

        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.skipped.len(), 1);
        assert_eq!(batch.skipped[0].index, 1);
        assert_eq!(batch.skipped[0].reason, DataQualityWarning::MissingChildId);
        assert_eq!(batch.warnings().count(), 1);
    }
}
