//! Attendance session orchestration.
//!
//! `AttendanceService` owns the grid the attendance page displays and is
//! the only thing that talks to the `AttendanceGateway`. Loading follows
//! DateRangeCalculator → fetch → RecordNormalizer → GridAssembler; edits go
//! through the OptimisticUpdateCoordinator; whole-class fills go through
//! BulkPresentOperation and end in a rebuild.

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use shared::{
    AttendanceStatus, ChildId, ClassId, WriteMetadata, WriteNotesRequest, WriteStatusRequest,
};
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::bulk_present::{BulkOutcome, BulkPresentOperation};
use super::commands::cell::CellValue;
use super::date_range::DateRangeCalculator;
use super::errors::{EngineError, ServiceError};
use super::grid_assembler::GridAssembler;
use super::models::date_window::DateWindow;
use super::models::grid::AttendanceGrid;
use super::notifications::{Notification, NotificationCenter};
use super::optimistic_update::{EditOutcome, OptimisticUpdateCoordinator};
use super::record_normalizer::{RecordNormalizer, SkippedRecord};
use super::status_cycle::StatusCycleEngine;
use crate::config::EngineConfig;
use crate::storage::traits::AttendanceGateway;

/// What a (re)load produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub class_id: ClassId,
    pub window: DateWindow,
    pub children: usize,
    /// Raw records that could not be placed in the grid
    pub skipped: Vec<SkippedRecord>,
}

/// The currently displayed class and its grid
struct LoadedGrid {
    class_id: ClassId,
    /// Shared with edits in flight, which settle against whatever grid is
    /// here when their write returns
    grid: Arc<Mutex<AttendanceGrid>>,
}

/// Service that drives one attendance page session
#[derive(Clone)]
pub struct AttendanceService {
    gateway: Arc<dyn AttendanceGateway>,
    calculator: DateRangeCalculator,
    session: Arc<Mutex<Option<LoadedGrid>>>,
    notifications: Arc<Mutex<NotificationCenter>>,
}

impl AttendanceService {
    pub fn new(
        gateway: Arc<dyn AttendanceGateway>,
        calculator: DateRangeCalculator,
        notification_ttl: Duration,
    ) -> Self {
        Self {
            gateway,
            calculator,
            session: Arc::new(Mutex::new(None)),
            notifications: Arc::new(Mutex::new(NotificationCenter::new(notification_ttl))),
        }
    }

    pub fn from_config(
        gateway: Arc<dyn AttendanceGateway>,
        config: &EngineConfig,
    ) -> Result<Self, EngineError> {
        let calculator = DateRangeCalculator::new(config.window_size)?;
        Ok(Self::new(gateway, calculator, config.notification_ttl()))
    }

    /// Build the grid for `class_id` ending at `anchor`, replacing whatever
    /// was loaded before
    pub async fn load(&self, class_id: &str, anchor: NaiveDate) -> Result<LoadReport, ServiceError> {
        let window = self.calculator.compute_window(anchor)?;
        info!(
            "🗓️ Loading attendance for class {} from {} to {}",
            class_id,
            window.oldest(),
            window.anchor()
        );

        let raws = match self
            .gateway
            .fetch_history(class_id, window.oldest(), window.anchor())
            .await
        {
            Ok(raws) => raws,
            Err(e) => return Err(self.fetch_failed("attendance history", e).await),
        };
        let roster = match self.gateway.fetch_roster_for_date(class_id, anchor).await {
            Ok(roster) => roster,
            Err(e) => return Err(self.fetch_failed("class roster", e).await),
        };

        let batch = RecordNormalizer::normalize_all(&raws);
        let mut grid = GridAssembler::assemble(&roster, &batch.records, &window);
        let children = grid.len();

        {
            let mut session = self.session.lock().await;
            match session.as_mut() {
                Some(loaded) => {
                    let mut current = loaded.grid.lock().await;
                    grid.supersede(&current);
                    *current = grid;
                    loaded.class_id = class_id.to_string();
                }
                None => {
                    *session = Some(LoadedGrid {
                        class_id: class_id.to_string(),
                        grid: Arc::new(Mutex::new(grid)),
                    });
                }
            }
        }

        if !batch.skipped.is_empty() {
            warn!(
                "{} attendance records for class {} could not be read",
                batch.skipped.len(),
                class_id
            );
            self.notifications.lock().await.push_warning(format!(
                "{} attendance record(s) could not be read and were left blank",
                batch.skipped.len()
            ));
        }

        Ok(LoadReport {
            class_id: class_id.to_string(),
            window,
            children,
            skipped: batch.skipped,
        })
    }

    /// Rebuild the current class around a new anchor date
    pub async fn change_anchor(&self, anchor: NaiveDate) -> Result<LoadReport, ServiceError> {
        let (class_id, _) = self.current().await?;
        self.load(&class_id, anchor).await
    }

    /// Switch to another class, keeping the anchor date
    pub async fn change_class(&self, class_id: &str) -> Result<LoadReport, ServiceError> {
        let (_, grid) = self.current().await?;
        let anchor = grid.lock().await.window().anchor();
        self.load(class_id, anchor).await
    }

    /// Rebuild from the API with the current class and anchor date
    pub async fn refresh(&self) -> Result<LoadReport, ServiceError> {
        let (class_id, grid) = self.current().await?;
        let anchor = grid.lock().await.window().anchor();
        self.load(&class_id, anchor).await
    }

    /// Copy of the grid as it stands, optimistic values included
    pub async fn grid_snapshot(&self) -> Result<AttendanceGrid, EngineError> {
        let (_, grid) = self.current().await?;
        let snapshot = grid.lock().await.clone();
        Ok(snapshot)
    }

    /// Optimistically set a child's status on the anchor date
    pub async fn set_status(
        &self,
        child_id: ChildId,
        status: AttendanceStatus,
        metadata: WriteMetadata,
    ) -> Result<EditOutcome, ServiceError> {
        let (_, grid) = self.current().await?;
        let gateway = Arc::clone(&self.gateway);

        let (_, outcome) = OptimisticUpdateCoordinator::apply_and_commit(
            &grid,
            child_id,
            CellValue::Status(status),
            move |edit| async move {
                gateway
                    .write_status(&WriteStatusRequest {
                        child_id,
                        date: edit.date,
                        status,
                        metadata,
                    })
                    .await
            },
        )
        .await?;

        self.report_edit(&grid, child_id, "attendance", &outcome).await;
        Ok(outcome)
    }

    /// Advance a child's anchor-date status one step around the cycle.
    ///
    /// Returns the status that was applied along with the edit's outcome.
    pub async fn cycle_status(
        &self,
        child_id: ChildId,
        metadata: WriteMetadata,
    ) -> Result<(AttendanceStatus, EditOutcome), ServiceError> {
        let (_, grid) = self.current().await?;
        let current = grid
            .lock()
            .await
            .anchor_status(child_id)
            .ok_or(EngineError::UnknownChild(child_id))?;

        let next = StatusCycleEngine::next(current);
        let outcome = self.set_status(child_id, next, metadata).await?;
        Ok((next, outcome))
    }

    /// Optimistically set a child's notes on the anchor date.
    /// Blank notes clear the field.
    pub async fn set_notes(
        &self,
        child_id: ChildId,
        notes: Option<String>,
        metadata: WriteMetadata,
    ) -> Result<EditOutcome, ServiceError> {
        let notes = notes
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());
        let (_, grid) = self.current().await?;
        let gateway = Arc::clone(&self.gateway);

        let (_, outcome) = OptimisticUpdateCoordinator::apply_and_commit(
            &grid,
            child_id,
            CellValue::Notes(notes.clone()),
            move |edit| async move {
                gateway
                    .write_notes(&WriteNotesRequest {
                        child_id,
                        date: edit.date,
                        notes,
                        metadata,
                    })
                    .await
            },
        )
        .await?;

        self.report_edit(&grid, child_id, "notes", &outcome).await;
        Ok(outcome)
    }

    /// Mark every child without a status on the anchor date present.
    ///
    /// The grid is not patched locally. A successful write is followed by a
    /// full rebuild; if that rebuild fails the error is returned even though
    /// the write itself went through.
    pub async fn bulk_present(&self, metadata: WriteMetadata) -> Result<BulkOutcome, ServiceError> {
        let (class_id, grid) = self.current().await?;
        let command = {
            let grid = grid.lock().await;
            let anchor = grid.window().anchor();
            BulkPresentOperation::prepare(&grid, &class_id, anchor, metadata)?
        };

        let Some(command) = command else {
            return Ok(BulkOutcome::NothingToMark);
        };
        let requested = command.targets.len();

        match self.gateway.write_bulk_present(&command.to_request()).await {
            Ok(response) => {
                info!(
                    "✅ Bulk present for class {}: {} requested, {} marked",
                    class_id, requested, response.marked_count
                );
                self.refresh().await?;
                Ok(BulkOutcome::Marked {
                    requested,
                    marked: response.marked_count,
                })
            }
            Err(e) => {
                let reason = format!("{:#}", e);
                error!("❌ Bulk present failed for class {}: {}", class_id, reason);
                self.notifications
                    .lock()
                    .await
                    .push_error(format!("Could not mark class present: {}", reason));
                Ok(BulkOutcome::Failed { requested, reason })
            }
        }
    }

    /// Messages that have not expired yet
    pub async fn active_notifications(&self) -> Vec<Notification> {
        self.notifications.lock().await.active()
    }

    pub async fn dismiss_notification(&self, id: Uuid) -> bool {
        self.notifications.lock().await.dismiss(id)
    }

    async fn current(&self) -> Result<(ClassId, Arc<Mutex<AttendanceGrid>>), EngineError> {
        let session = self.session.lock().await;
        session
            .as_ref()
            .map(|loaded| (loaded.class_id.clone(), Arc::clone(&loaded.grid)))
            .ok_or(EngineError::NoGridLoaded)
    }

    async fn report_edit(
        &self,
        grid: &Mutex<AttendanceGrid>,
        child_id: ChildId,
        what: &str,
        outcome: &EditOutcome,
    ) {
        if outcome.is_confirmed() {
            return;
        }
        let name = grid
            .lock()
            .await
            .row(child_id)
            .map(|row| row.child.name.clone())
            .unwrap_or_else(|| format!("child {}", child_id));

        let mut notifications = self.notifications.lock().await;
        match outcome {
            EditOutcome::RolledBack { reason, .. } => {
                notifications.push_error(format!("Could not save {} for {}: {}", what, name, reason));
            }
            EditOutcome::Superseded { reason } => {
                notifications.push_warning(format!(
                    "An earlier change to {} for {} was not saved: {}",
                    what, name, reason
                ));
            }
            EditOutcome::Confirmed => {}
        }
    }

    async fn fetch_failed(&self, what: &str, e: anyhow::Error) -> ServiceError {
        error!("❌ Failed to fetch {}: {:#}", what, e);
        self.notifications
            .lock()
            .await
            .push_error(format!("Could not load {}", what));
        ServiceError::Fetch(e.context(format!("fetching {}", what)))
    }
}
