//! Inclusive date-range restriction of the enriched table.

use chrono::NaiveDate;

use crate::domain::EnrichedRow;
use crate::error::AppError;

/// A validated inclusive `[start, end]` interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, AppError> {
        if start > end {
            return Err(AppError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Build a range from optional CLI bounds; a missing side is open.
    pub fn from_bounds(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Self, AppError> {
        Self::new(start.unwrap_or(NaiveDate::MIN), end.unwrap_or(NaiveDate::MAX))
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Rows whose date falls inside `range`, in their original order.
///
/// An empty result is not an error.
pub fn filter_range(rows: &[EnrichedRow], range: &DateRange) -> Vec<EnrichedRow> {
    rows.iter().filter(|r| range.contains(r.date())).copied().collect()
}
