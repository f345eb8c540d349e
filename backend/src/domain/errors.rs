use chrono::NaiveDate;
use shared::ChildId;

/// Precondition violations in the engine.
///
/// These are programming errors in the caller (bad window size, malformed
/// anchor date, an edit aimed at a column or child that is not editable).
/// They fail fast instead of being coerced into something displayable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("Window size must be at least 1, got {0}")]
    InvalidWindowSize(usize),
    #[error("Anchor date must be YYYY-MM-DD, got {0:?}")]
    InvalidAnchorDate(String),
    #[error("Window of {size} days ending {anchor} runs past the supported calendar range")]
    DateOutOfRange { anchor: NaiveDate, size: usize },
    #[error("{date} is not the anchor date {anchor}; only the anchor column is editable")]
    NotAnchorDate { date: NaiveDate, anchor: NaiveDate },
    #[error("Child {0} is not on the loaded roster")]
    UnknownChild(ChildId),
    #[error("No attendance grid has been loaded yet")]
    NoGridLoaded,
}

/// Errors returned by `AttendanceService`
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    /// Reading from the record-keeping API failed. Write failures never show
    /// up here; they are rolled back and surfaced as notifications.
    #[error("Failed to load attendance data: {0:#}")]
    Fetch(anyhow::Error),
}
