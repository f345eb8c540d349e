use std::collections::BTreeSet;

use chrono::NaiveDate;
use shared::{AttendanceStatus, ChildId, WriteMetadata};
use tracing::info;

use super::commands::bulk::BulkPresentCommand;
use super::errors::EngineError;
use super::models::grid::AttendanceGrid;

/// How a bulk-present request ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkOutcome {
    /// Every child already had a status; no request was sent
    NothingToMark,
    /// The write succeeded and the grid was rebuilt from the API
    Marked { requested: usize, marked: u32 },
    /// The write failed; the grid was left as it was
    Failed { requested: usize, reason: String },
}

/// Fills every unrecorded anchor cell of a class with `Present`.
///
/// Children who already have any status are never overwritten. The grid is
/// not touched optimistically: after a successful write the owner rebuilds
/// it from the API.
pub struct BulkPresentOperation;

impl BulkPresentOperation {
    /// Children whose record on `date` is still `Unrecorded`.
    ///
    /// `date` must be the grid's anchor date.
    pub fn compute_targets(
        grid: &AttendanceGrid,
        date: NaiveDate,
    ) -> Result<BTreeSet<ChildId>, EngineError> {
        let anchor = grid.window().anchor();
        if date != anchor {
            return Err(EngineError::NotAnchorDate { date, anchor });
        }

        Ok(grid
            .rows()
            .iter()
            .filter(|row| {
                row.anchor_cell()
                    .map(|cell| cell.status == AttendanceStatus::Unrecorded)
                    .unwrap_or(false)
            })
            .map(|row| row.child.id)
            .collect())
    }

    /// The command to send, or `None` when there is nobody left to mark
    pub fn prepare(
        grid: &AttendanceGrid,
        class_id: &str,
        date: NaiveDate,
        metadata: WriteMetadata,
    ) -> Result<Option<BulkPresentCommand>, EngineError> {
        let targets = Self::compute_targets(grid, date)?;
        if targets.is_empty() {
            info!("✅ Everyone in class {} already has a status for {}", class_id, date);
            return Ok(None);
        }

        info!(
            "Marking {} of {} children present in class {} for {}",
            targets.len(),
            grid.len(),
            class_id,
            date
        );

        Ok(Some(BulkPresentCommand {
            class_id: class_id.to_string(),
            date,
            targets,
            metadata,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::date_range::compute_window;
    use crate::domain::grid_assembler::GridAssembler;
    use crate::domain::models::attendance_record::AttendanceRecord;
    use shared::Child;

    fn anchor() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 10).unwrap()
    }

    fn grid(records: &[AttendanceRecord]) -> AttendanceGrid {
        let window = compute_window(anchor(), 5).unwrap();
        let roster = vec![
            Child::new(1, "Ava"),
            Child::new(2, "Ben"),
            Child::new(3, "Cleo"),
            Child::new(4, "Dev"),
        ];
        GridAssembler::assemble(&roster, records, &window)
    }

    #[test]
    fn test_only_unrecorded_children_are_targeted() {
        let grid = grid(&[
            AttendanceRecord::unrecorded(2, anchor()).with_status(AttendanceStatus::Absent),
            AttendanceRecord::unrecorded(4, anchor()).with_status(AttendanceStatus::Late),
        ]);

        let targets = BulkPresentOperation::compute_targets(&grid, anchor()).unwrap();

        assert_eq!(targets.into_iter().collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn test_older_columns_do_not_matter() {
        let yesterday = anchor().pred_opt().unwrap();
        let grid = grid(&[
            AttendanceRecord::unrecorded(1, yesterday).with_status(AttendanceStatus::Present),
        ]);

        let targets = BulkPresentOperation::compute_targets(&grid, anchor()).unwrap();

        assert_eq!(targets.len(), 4);
    }

    #[test]
    fn test_non_anchor_date_is_rejected() {
        let grid = grid(&[]);
        let yesterday = anchor().pred_opt().unwrap();

        assert_eq!(
            BulkPresentOperation::compute_targets(&grid, yesterday),
            Err(EngineError::NotAnchorDate {
                date: yesterday,
                anchor: anchor()
            })
        );
    }

    #[test]
    fn test_second_pass_has_no_targets() {
        let grid_before = grid(&[]);
        let first = BulkPresentOperation::compute_targets(&grid_before, anchor()).unwrap();

        // what a rebuild after a successful write would return
        let marked: Vec<AttendanceRecord> = first
            .iter()
            .map(|id| AttendanceRecord::unrecorded(*id, anchor()).with_status(AttendanceStatus::Present))
            .collect();
        let grid_after = grid(&marked);

        let second = BulkPresentOperation::compute_targets(&grid_after, anchor()).unwrap();
        assert!(second.is_empty());
        assert_eq!(
            BulkPresentOperation::prepare(&grid_after, "class-1", anchor(), WriteMetadata::default())
                .unwrap(),
            None
        );
    }

    #[test]
    fn test_prepare_builds_request() {
        let grid = grid(&[
            AttendanceRecord::unrecorded(3, anchor()).with_status(AttendanceStatus::Absent),
        ]);

        let command = BulkPresentOperation::prepare(
            &grid,
            "class-1",
            anchor(),
            WriteMetadata::recorded_by("Ms. Rivera"),
        )
        .unwrap()
        .unwrap();

        let request = command.to_request();
        assert_eq!(request.class_id, "class-1");
        assert_eq!(request.date, anchor());
        assert_eq!(request.child_ids, vec![1, 2, 4]);
        assert_eq!(request.metadata.recorded_by.as_deref(), Some("Ms. Rivera"));
    }
}
