use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;
use shared::{AttendanceStatus, Child, ChildId};

use super::attendance_record::AttendanceRecord;
use super::date_window::DateWindow;
use crate::domain::commands::cell::{CellRef, CellValue};

/// One child's row: a record per window date, index-aligned with the window
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridRow {
    pub child: Child,
    pub cells: Vec<AttendanceRecord>,
}

impl GridRow {
    /// The record for the anchor date (column 0)
    pub fn anchor_cell(&self) -> Option<&AttendanceRecord> {
        self.cells.first()
    }
}

/// Status counts for a single window date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColumnSummary {
    pub date: NaiveDate,
    pub present: usize,
    pub absent: usize,
    pub late: usize,
    pub unrecorded: usize,
}

impl ColumnSummary {
    fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            present: 0,
            absent: 0,
            late: 0,
            unrecorded: 0,
        }
    }

    pub fn total(&self) -> usize {
        self.present + self.absent + self.late + self.unrecorded
    }
}

/// Per-child, per-date matrix of attendance records covering one window.
///
/// Every child on the anchor-date roster has exactly `window.len()` cells and
/// there are no holes. The grid also tracks:
/// - an `epoch`, bumped by the owner on every full rebuild, so edits begun
///   against an older grid can tell they were superseded;
/// - a generation per editable anchor cell, bumped on every optimistic edit,
///   so a late failure only rolls back the write that set the current value.
#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceGrid {
    window: DateWindow,
    rows: Vec<GridRow>,
    index: HashMap<ChildId, usize>,
    generations: HashMap<CellRef, u64>,
    /// Restore points left by failed edits that no longer owned their cell,
    /// keyed by the failed edit's generation: an edit made on top of that
    /// generation rolls back to this value instead of its own `previous`
    handed_down: HashMap<(CellRef, u64), (CellValue, u64)>,
    epoch: u64,
}

impl AttendanceGrid {
    pub(crate) fn new(window: DateWindow, rows: Vec<GridRow>) -> Self {
        let index = rows
            .iter()
            .enumerate()
            .map(|(position, row)| (row.child.id, position))
            .collect();

        Self {
            window,
            rows,
            index,
            generations: HashMap::new(),
            handed_down: HashMap::new(),
            epoch: 0,
        }
    }

    pub fn window(&self) -> &DateWindow {
        &self.window
    }

    /// Rows in roster order
    pub fn rows(&self) -> &[GridRow] {
        &self.rows
    }

    pub fn row(&self, child_id: ChildId) -> Option<&GridRow> {
        self.index.get(&child_id).map(|&position| &self.rows[position])
    }

    pub fn contains_child(&self, child_id: ChildId) -> bool {
        self.index.contains_key(&child_id)
    }

    pub fn child_ids(&self) -> impl Iterator<Item = ChildId> + '_ {
        self.rows.iter().map(|row| row.child.id)
    }

    /// Number of children in the grid
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn cell(&self, child_id: ChildId, column: usize) -> Option<&AttendanceRecord> {
        self.row(child_id).and_then(|row| row.cells.get(column))
    }

    pub fn cell_on(&self, child_id: ChildId, date: NaiveDate) -> Option<&AttendanceRecord> {
        self.window
            .index_of(date)
            .and_then(|column| self.cell(child_id, column))
    }

    pub fn anchor_cell(&self, child_id: ChildId) -> Option<&AttendanceRecord> {
        self.cell(child_id, 0)
    }

    pub(crate) fn anchor_cell_mut(&mut self, child_id: ChildId) -> Option<&mut AttendanceRecord> {
        let position = *self.index.get(&child_id)?;
        self.rows[position].cells.first_mut()
    }

    pub fn anchor_status(&self, child_id: ChildId) -> Option<AttendanceStatus> {
        self.anchor_cell(child_id).map(|record| record.status)
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Take over from `previous`: this grid is a full rebuild and every edit
    /// still in flight against `previous` is now stale.
    pub(crate) fn supersede(&mut self, previous: &AttendanceGrid) {
        self.epoch = previous.epoch + 1;
    }

    pub fn generation(&self, cell: &CellRef) -> u64 {
        self.generations.get(cell).copied().unwrap_or(0)
    }

    pub(crate) fn bump_generation(&mut self, cell: CellRef) -> u64 {
        let generation = self.generations.entry(cell).or_insert(0);
        *generation += 1;
        *generation
    }

    pub(crate) fn set_generation(&mut self, cell: CellRef, generation: u64) {
        self.generations.insert(cell, generation);
    }

    pub(crate) fn hand_down(
        &mut self,
        cell: CellRef,
        generation: u64,
        value: CellValue,
        value_generation: u64,
    ) {
        self.handed_down
            .insert((cell, generation), (value, value_generation));
    }

    pub(crate) fn take_handed_down(
        &mut self,
        cell: CellRef,
        generation: u64,
    ) -> Option<(CellValue, u64)> {
        self.handed_down.remove(&(cell, generation))
    }

    /// Status counts for the column at `column`
    pub fn column_summary(&self, column: usize) -> Option<ColumnSummary> {
        let date = *self.window.dates().get(column)?;
        let mut summary = ColumnSummary::empty(date);

        for record in self.rows.iter().filter_map(|row| row.cells.get(column)) {
            match record.status {
                AttendanceStatus::Present => summary.present += 1,
                AttendanceStatus::Absent => summary.absent += 1,
                AttendanceStatus::Late => summary.late += 1,
                AttendanceStatus::Unrecorded => summary.unrecorded += 1,
            }
        }

        Some(summary)
    }

    /// One summary per window date, anchor first
    pub fn summaries(&self) -> Vec<ColumnSummary> {
        (0..self.window.len())
            .filter_map(|column| self.column_summary(column))
            .collect()
    }

    /// True when every row has one cell per window date, in window order,
    /// belonging to that row's child
    pub fn is_complete(&self) -> bool {
        self.rows.iter().all(|row| {
            row.cells.len() == self.window.len()
                && row
                    .cells
                    .iter()
                    .zip(self.window.dates())
                    .all(|(record, date)| record.date == *date && record.child_id == row.child.id)
        })
    }
}
