use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use shared::{Child, ChildId};
use tracing::{debug, info};

use super::models::attendance_record::AttendanceRecord;
use super::models::date_window::DateWindow;
use super::models::grid::{AttendanceGrid, GridRow};

/// Builds the per-child, per-date grid from a roster and normalized records
pub struct GridAssembler;

impl GridAssembler {
    /// Cross `roster` (as of the anchor date) with every window date.
    ///
    /// Cells with a matching record take it; the rest get an `Unrecorded`
    /// placeholder. When several records share a (child, date) pair the last
    /// one wins. Records for children outside the roster or dates outside
    /// the window are ignored. A child listed twice on the roster keeps its
    /// first position.
    pub fn assemble(
        roster: &[Child],
        records: &[AttendanceRecord],
        window: &DateWindow,
    ) -> AttendanceGrid {
        let mut by_cell: HashMap<(ChildId, NaiveDate), &AttendanceRecord> = HashMap::new();
        let mut duplicates = 0usize;
        for record in records {
            if by_cell.insert((record.child_id, record.date), record).is_some() {
                duplicates += 1;
            }
        }
        if duplicates > 0 {
            debug!("{} duplicate attendance records replaced by later ones", duplicates);
        }

        let mut seen: HashSet<ChildId> = HashSet::new();
        let rows: Vec<GridRow> = roster
            .iter()
            .filter(|child| seen.insert(child.id))
            .map(|child| GridRow {
                child: child.clone(),
                cells: window
                    .dates()
                    .iter()
                    .map(|date| {
                        by_cell
                            .get(&(child.id, *date))
                            .map(|record| (*record).clone())
                            .unwrap_or_else(|| AttendanceRecord::unrecorded(child.id, *date))
                    })
                    .collect(),
            })
            .collect();

        let placed = rows
            .iter()
            .flat_map(|row| row.cells.iter())
            .filter(|cell| by_cell.contains_key(&(cell.child_id, cell.date)))
            .count();

        info!(
            "📋 Assembled attendance grid: {} children × {} days, {} of {} cells recorded",
            rows.len(),
            window.len(),
            placed,
            rows.len() * window.len()
        );

        AttendanceGrid::new(window.clone(), rows)
    }
}
