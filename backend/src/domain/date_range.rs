//! Trailing date window for the attendance grid.
//!
//! Dates are plain calendar dates (`NaiveDate`), never instants, so no local
//! time offset can push a column across a day boundary.

use chrono::{Days, NaiveDate};
use tracing::debug;

use super::errors::EngineError;
use super::models::date_window::DateWindow;

/// Window size used by the attendance page
pub const DEFAULT_WINDOW_SIZE: usize = 5;

/// Produces the window of dates the grid covers for a given anchor date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRangeCalculator {
    window_size: usize,
}

impl DateRangeCalculator {
    /// Create a calculator for windows of `window_size` days
    pub fn new(window_size: usize) -> Result<Self, EngineError> {
        if window_size == 0 {
            return Err(EngineError::InvalidWindowSize(window_size));
        }
        Ok(Self { window_size })
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Window ending at `anchor`, most recent first
    pub fn compute_window(&self, anchor: NaiveDate) -> Result<DateWindow, EngineError> {
        compute_window(anchor, self.window_size)
    }

    /// Parse an anchor date given as `YYYY-MM-DD`.
    ///
    /// Anything else (including a timestamp) is rejected: the anchor comes
    /// from the caller, not from the wire, so there is nothing to normalize.
    pub fn parse_anchor(value: &str) -> Result<NaiveDate, EngineError> {
        NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
            .map_err(|_| EngineError::InvalidAnchorDate(value.to_string()))
    }
}

impl Default for DateRangeCalculator {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
        }
    }
}

/// `size` consecutive dates where `result[i] = anchor - i days`
pub fn compute_window(anchor: NaiveDate, size: usize) -> Result<DateWindow, EngineError> {
    if size == 0 {
        return Err(EngineError::InvalidWindowSize(size));
    }

    let dates = (0..size)
        .map(|offset| anchor.checked_sub_days(Days::new(offset as u64)))
        .collect::<Option<Vec<_>>>()
        .ok_or(EngineError::DateOutOfRange { anchor, size })?;

    debug!(
        "🗓️ Computed {}-day window {} .. {}",
        size,
        anchor,
        dates.last().copied().unwrap_or(anchor)
    );

    Ok(DateWindow::new(anchor, dates))
}
