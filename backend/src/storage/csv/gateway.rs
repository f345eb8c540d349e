use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use shared::{
    BulkPresentRequest, BulkPresentResponse, Child, ChildId, RawAttendanceRecord,
    WriteNotesRequest, WriteStatusRequest,
};
use tokio::sync::Mutex;
use tracing::info;

use super::attendance_repository::AttendanceRepository;
use super::connection::CsvConnection;
use super::roster_repository::RosterRepository;
use crate::storage::traits::AttendanceGateway;

/// `AttendanceGateway` over the CSV data directory
#[derive(Debug, Clone)]
pub struct CsvAttendanceGateway {
    roster: RosterRepository,
    attendance: AttendanceRepository,
    /// Serializes read-modify-write cycles on `attendance.csv`
    write_lock: Arc<Mutex<()>>,
}

impl CsvAttendanceGateway {
    pub fn new(connection: CsvConnection) -> Self {
        Self {
            roster: RosterRepository::new(connection.clone()),
            attendance: AttendanceRepository::new(connection),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn roster(&self) -> &RosterRepository {
        &self.roster
    }

    pub fn attendance(&self) -> &AttendanceRepository {
        &self.attendance
    }
}

#[async_trait]
impl AttendanceGateway for CsvAttendanceGateway {
    async fn fetch_history(
        &self,
        class_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<RawAttendanceRecord>> {
        if end_date < start_date {
            bail!("History range is reversed: {} .. {}", start_date, end_date);
        }
        let members: HashSet<ChildId> = self
            .roster
            .list_rows(class_id)?
            .into_iter()
            .map(|row| row.child_id)
            .collect();
        self.attendance.history(&members, start_date, end_date)
    }

    async fn fetch_roster_for_date(&self, class_id: &str, date: NaiveDate) -> Result<Vec<Child>> {
        self.roster.roster_for_date(class_id, date)
    }

    async fn write_status(&self, request: &WriteStatusRequest) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let recorded_by = request.metadata.recorded_by.clone().unwrap_or_default();
        self.attendance.upsert(request.child_id, request.date, |row| {
            row.status = request.status.as_str().to_string();
            row.recorded_by = recorded_by;
        })?;
        info!(
            "💾 Saved {} for child {} on {}",
            request.status, request.child_id, request.date
        );
        Ok(())
    }

    async fn write_notes(&self, request: &WriteNotesRequest) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let recorded_by = request.metadata.recorded_by.clone().unwrap_or_default();
        self.attendance.upsert(request.child_id, request.date, |row| {
            row.notes = request.notes.clone().unwrap_or_default();
            row.recorded_by = recorded_by;
        })?;
        info!("💾 Saved notes for child {} on {}", request.child_id, request.date);
        Ok(())
    }

    async fn write_bulk_present(&self, request: &BulkPresentRequest) -> Result<BulkPresentResponse> {
        let _guard = self.write_lock.lock().await;

        // Only children actually on the roster that day, whatever the client sent
        let requested: HashSet<ChildId> = request.child_ids.iter().copied().collect();
        let candidates: Vec<ChildId> = self
            .roster
            .roster_for_date(&request.class_id, request.date)?
            .into_iter()
            .map(|child| child.id)
            .filter(|id| requested.contains(id))
            .collect();

        let marked_count = self.attendance.mark_present(
            &candidates,
            request.date,
            request.metadata.recorded_by.as_deref(),
        )?;

        info!(
            "💾 Marked {} children present in class {} on {}",
            marked_count, request.class_id, request.date
        );
        Ok(BulkPresentResponse { marked_count })
    }
}
