//! # Storage Traits
//!
//! The attendance engine reaches the record-keeping API only through this
//! trait, so the domain layer works the same against the remote service, the
//! CSV files used by the CLI, or a scripted test double.

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use shared::{
    BulkPresentRequest, BulkPresentResponse, Child, RawAttendanceRecord, WriteNotesRequest,
    WriteStatusRequest,
};

/// Trait defining the collaborator interface for attendance data
///
/// Reads return records as the API shapes them; normalization is the
/// domain's job. Writes report failure through `Err`; retries, if any, are
/// the implementation's concern.
#[async_trait]
pub trait AttendanceGateway: Send + Sync {
    /// Attendance records for a class between two dates (inclusive).
    /// Not guaranteed deduplicated or uniformly shaped.
    async fn fetch_history(
        &self,
        class_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<RawAttendanceRecord>>;

    /// Children belonging to the class as of `date`
    async fn fetch_roster_for_date(&self, class_id: &str, date: NaiveDate) -> Result<Vec<Child>>;

    /// Set the status of one (child, date) cell
    async fn write_status(&self, request: &WriteStatusRequest) -> Result<()>;

    /// Set the notes of one (child, date) cell
    async fn write_notes(&self, request: &WriteNotesRequest) -> Result<()>;

    /// Mark unrecorded children present for one class and date.
    /// Implementations skip already-recorded children themselves too.
    async fn write_bulk_present(&self, request: &BulkPresentRequest) -> Result<BulkPresentResponse>;
}
