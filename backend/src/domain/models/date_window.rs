use chrono::NaiveDate;
use serde::Serialize;

/// Consecutive calendar dates ending at the anchor date, most recent first.
///
/// `dates()[i] == anchor - i days`. Built only by `DateRangeCalculator`, so
/// it is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    anchor: NaiveDate,
    dates: Vec<NaiveDate>,
}

impl DateWindow {
    pub(crate) fn new(anchor: NaiveDate, dates: Vec<NaiveDate>) -> Self {
        Self { anchor, dates }
    }

    /// The most recent date, and the only editable column
    pub fn anchor(&self) -> NaiveDate {
        self.anchor
    }

    /// The oldest date in the window (start of the history fetch range)
    pub fn oldest(&self) -> NaiveDate {
        self.dates.last().copied().unwrap_or(self.anchor)
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Column index of `date`, if it falls inside the window
    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        let offset = (self.anchor - date).num_days();
        if offset < 0 {
            return None;
        }
        let index = offset as usize;
        (index < self.dates.len()).then_some(index)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.index_of(date).is_some()
    }

    pub fn is_anchor(&self, date: NaiveDate) -> bool {
        date == self.anchor
    }
}
