use std::collections::HashSet;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use shared::{AttendanceStatus, ChildId, RawAttendanceRecord};
use tracing::{debug, warn};

use super::connection::{write_atomically, CsvConnection};
use crate::domain::record_normalizer::{parse_calendar_date, parse_status};

/// One line of `attendance.csv`.
///
/// Kept as loose text on purpose: the file may be edited by hand, and
/// whatever it holds is handed to the record normalizer as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRow {
    pub child_id: String,
    pub date: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub recorded_by: String,
}

impl AttendanceRow {
    pub fn child(&self) -> Option<ChildId> {
        self.child_id.trim().parse().ok()
    }

    pub fn calendar_date(&self) -> Option<NaiveDate> {
        parse_calendar_date(&self.date)
    }

    fn is_cell(&self, child_id: ChildId, date: NaiveDate) -> bool {
        self.child() == Some(child_id) && self.calendar_date() == Some(date)
    }

    /// Whether the row carries a status the grid can show. Blank,
    /// `unrecorded` and unreadable values all count as no status, matching
    /// the placeholder the normalizer leaves for them.
    pub fn is_recorded(&self) -> bool {
        parse_status(&self.status).map_or(false, |status| status.is_recorded())
    }

    /// Shape the row like the remote API does
    fn to_raw(&self) -> RawAttendanceRecord {
        let child_id = self
            .child()
            .map(Value::from)
            .unwrap_or_else(|| Value::String(self.child_id.clone()));
        let text = |value: &str| {
            if value.is_empty() {
                Value::Null
            } else {
                Value::String(value.to_string())
            }
        };

        RawAttendanceRecord::new(json!({
            "childId": child_id,
            "date": self.date,
            "status": text(&self.status),
            "notes": text(&self.notes),
            "recordedBy": text(&self.recorded_by),
        }))
    }
}

/// Attendance rows for every class, stored in a single CSV file
#[derive(Debug, Clone)]
pub struct AttendanceRepository {
    connection: CsvConnection,
}

impl AttendanceRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    pub fn list_rows(&self) -> Result<Vec<AttendanceRow>> {
        let path = self.connection.attendance_file_path();
        if !path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_path(&path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        reader
            .deserialize()
            .collect::<Result<Vec<AttendanceRow>, csv::Error>>()
            .with_context(|| format!("Failed to read {}", path.display()))
    }

    pub fn save_rows(&self, rows: &[AttendanceRow]) -> Result<()> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for row in rows {
            writer.serialize(row)?;
        }
        let bytes = writer.into_inner().context("Failed to flush attendance rows")?;
        write_atomically(&self.connection.attendance_file_path(), &bytes)
    }

    /// Raw records for `children` between `start` and `end` (inclusive)
    pub fn history(
        &self,
        children: &HashSet<ChildId>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RawAttendanceRecord>> {
        let mut records = Vec::new();
        for row in self.list_rows()? {
            let Some(child_id) = row.child() else {
                warn!("Skipping attendance row with child id {:?}", row.child_id);
                continue;
            };
            if !children.contains(&child_id) {
                continue;
            }
            match row.calendar_date() {
                Some(date) if start <= date && date <= end => records.push(row.to_raw()),
                Some(_) => {}
                None => warn!("Skipping attendance row with date {:?}", row.date),
            }
        }

        debug!("Read {} attendance rows between {} and {}", records.len(), start, end);
        Ok(records)
    }

    /// Update the row for (child, date), creating it if needed
    pub fn upsert<F>(&self, child_id: ChildId, date: NaiveDate, update: F) -> Result<()>
    where
        F: FnOnce(&mut AttendanceRow),
    {
        let mut rows = self.list_rows()?;
        match rows.iter_mut().find(|row| row.is_cell(child_id, date)) {
            Some(row) => update(row),
            None => {
                let mut row = AttendanceRow {
                    child_id: child_id.to_string(),
                    date: date.to_string(),
                    ..AttendanceRow::default()
                };
                update(&mut row);
                rows.push(row);
            }
        }
        self.save_rows(&rows)
    }

    /// Mark `candidates` present on `date`, skipping anyone who already has a
    /// status. Returns how many rows were written.
    pub fn mark_present(
        &self,
        candidates: &[ChildId],
        date: NaiveDate,
        recorded_by: Option<&str>,
    ) -> Result<u32> {
        let mut rows = self.list_rows()?;
        let mut marked = 0u32;

        for &child_id in candidates {
            let recorded_by = recorded_by.unwrap_or_default().to_string();
            match rows.iter_mut().find(|row| row.is_cell(child_id, date)) {
                Some(row) if row.is_recorded() => continue,
                Some(row) => {
                    row.status = AttendanceStatus::Present.as_str().to_string();
                    row.recorded_by = recorded_by;
                }
                None => rows.push(AttendanceRow {
                    child_id: child_id.to_string(),
                    date: date.to_string(),
                    status: AttendanceStatus::Present.as_str().to_string(),
                    notes: String::new(),
                    recorded_by,
                }),
            }
            marked += 1;
        }

        if marked > 0 {
            self.save_rows(&rows)?;
        }
        Ok(marked)
    }
}
