//! Optimistic single-cell edits with rollback.
//!
//! An edit is applied to the grid first and written to the API second. If the
//! write fails, the cell is restored, but only when the cell still holds the
//! value this edit put there: a later edit to the same cell, or a full
//! rebuild of the grid, always wins over a late failure.
//!
//! When overlapping edits to one cell fail, the cell ends up back at the value
//! it had before the oldest failed edit, whatever order the failures arrive
//! in. A failed edit that no longer owns its cell leaves its own restore point
//! to the edit made on top of it.

use std::future::Future;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::commands::cell::{CellEdit, CellField, CellRef, CellValue};
use super::errors::EngineError;
use super::models::attendance_record::AttendanceRecord;
use super::models::grid::AttendanceGrid;
use shared::ChildId;

/// How an optimistic edit ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// The write succeeded; the optimistic value is authoritative
    Confirmed,
    /// The write failed and the cell was restored to `restored`
    RolledBack { restored: CellValue, reason: String },
    /// The write failed, but a newer edit or a rebuild owns the cell now, so
    /// nothing was restored
    Superseded { reason: String },
}

impl EditOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, EditOutcome::Confirmed)
    }
}

pub struct OptimisticUpdateCoordinator;

impl OptimisticUpdateCoordinator {
    /// Apply `value` to the anchor cell of `child_id` and return the command
    /// needed to undo it
    pub fn begin(
        grid: &mut AttendanceGrid,
        child_id: ChildId,
        value: CellValue,
    ) -> Result<CellEdit, EngineError> {
        let date = grid.window().anchor();
        let epoch = grid.epoch();
        let cell = CellRef {
            child_id,
            field: value.field(),
        };

        let record = grid
            .anchor_cell_mut(child_id)
            .ok_or(EngineError::UnknownChild(child_id))?;
        let previous = read_field(record, cell.field);
        write_field(record, value.clone());

        let previous_generation = grid.generation(&cell);
        let generation = grid.bump_generation(cell);

        debug!(
            "✏️ Optimistic edit child={} date={} {:?} -> {:?} (gen {})",
            child_id, date, previous, value, generation
        );

        Ok(CellEdit {
            cell,
            date,
            previous,
            applied: value,
            previous_generation,
            generation,
            epoch,
        })
    }

    /// Whether `edit` is still the latest thing written to its cell
    pub fn owns_cell(grid: &AttendanceGrid, edit: &CellEdit) -> bool {
        if grid.epoch() != edit.epoch || grid.generation(&edit.cell) != edit.generation {
            return false;
        }
        grid.anchor_cell(edit.cell.child_id)
            .map(|record| read_field(record, edit.cell.field) == edit.applied)
            .unwrap_or(false)
    }

    /// Restore the cell if the edit still owns it.
    ///
    /// Returns the value that was restored, if any.
    pub fn rollback(grid: &mut AttendanceGrid, edit: &CellEdit) -> Option<CellValue> {
        if !Self::owns_cell(grid, edit) {
            return None;
        }
        let (value, generation) = Self::restore_point(grid, edit);
        let record = grid.anchor_cell_mut(edit.cell.child_id)?;
        write_field(record, value.clone());
        grid.set_generation(edit.cell, generation);
        Some(value)
    }

    /// Value (and generation) the cell had before `edit`, skipping over any
    /// failed edits underneath it
    fn restore_point(grid: &mut AttendanceGrid, edit: &CellEdit) -> (CellValue, u64) {
        let mut value = edit.previous.clone();
        let mut generation = edit.previous_generation;
        // Generations strictly decrease along the chain
        while let Some((older_value, older_generation)) =
            grid.take_handed_down(edit.cell, generation)
        {
            value = older_value;
            generation = older_generation;
        }
        (value, generation)
    }

    /// Resolve an edit once its write has finished
    pub fn settle(
        grid: &mut AttendanceGrid,
        edit: &CellEdit,
        result: anyhow::Result<()>,
    ) -> EditOutcome {
        match result {
            Ok(()) => {
                debug!("Write confirmed for child {} ({:?})", edit.cell.child_id, edit.cell.field);
                EditOutcome::Confirmed
            }
            Err(error) => {
                let reason = format!("{:#}", error);
                if let Some(restored) = Self::rollback(grid, edit) {
                    warn!(
                        "↩️ Rolled back {:?} for child {} on {}: {}",
                        edit.cell.field, edit.cell.child_id, edit.date, reason
                    );
                    return EditOutcome::RolledBack { restored, reason };
                }

                if grid.epoch() == edit.epoch {
                    let (value, generation) = Self::restore_point(grid, edit);
                    grid.hand_down(edit.cell, edit.generation, value, generation);
                }
                info!(
                    "Write for child {} failed after a newer change; keeping the newer value: {}",
                    edit.cell.child_id, reason
                );
                EditOutcome::Superseded { reason }
            }
        }
    }

    /// Apply the edit, release the grid, run `write`, then settle.
    ///
    /// The grid lock is not held while `write` is pending, so readers see the
    /// optimistic value immediately and further edits can be issued.
    pub async fn apply_and_commit<F, Fut>(
        grid: &Mutex<AttendanceGrid>,
        child_id: ChildId,
        value: CellValue,
        write: F,
    ) -> Result<(CellEdit, EditOutcome), EngineError>
    where
        F: FnOnce(CellEdit) -> Fut,
        Fut: Future<Output = anyhow::Result<()>>,
    {
        let edit = {
            let mut guard = grid.lock().await;
            Self::begin(&mut guard, child_id, value)?
        };

        let result = write(edit.clone()).await;

        let mut guard = grid.lock().await;
        let outcome = Self::settle(&mut guard, &edit, result);
        Ok((edit, outcome))
    }
}

fn read_field(record: &AttendanceRecord, field: CellField) -> CellValue {
    match field {
        CellField::Status => CellValue::Status(record.status),
        CellField::Notes => CellValue::Notes(record.notes.clone()),
    }
}

fn write_field(record: &mut AttendanceRecord, value: CellValue) {
    match value {
        CellValue::Status(status) => record.status = status,
        CellValue::Notes(notes) => record.notes = notes,
    }
}
