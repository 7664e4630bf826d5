//! Degrading budget line.
//!
//! ```text
//! budget(date) = baseline% × (1 − annual_degradation)^(days_since_start / 365.25)
//! ```
//!
//! Elapsed time is measured in actual calendar days, so leap days count.

use chrono::NaiveDate;

use crate::domain::BudgetParams;
use crate::error::AppError;

/// Average Gregorian year length used to turn elapsed days into years.
pub const DAYS_PER_YEAR: f64 = 365.25;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BudgetLine {
    baseline_pct: f64,
    annual_degradation: f64,
    start: NaiveDate,
}

impl BudgetLine {
    /// Build the line for a run.
    ///
    /// `first_date` is the dataset's first date; it becomes the reference unless
    /// `params.plant_start` overrides it.
    pub fn new(params: &BudgetParams, first_date: NaiveDate) -> Result<Self, AppError> {
        if !(params.baseline_pct.is_finite() && params.baseline_pct > 0.0) {
            return Err(AppError::config(format!(
                "Invalid budget baseline {} (must be finite and > 0).",
                params.baseline_pct
            )));
        }
        if !(params.annual_degradation.is_finite() && (0.0..1.0).contains(&params.annual_degradation)) {
            return Err(AppError::config(format!(
                "Invalid annual degradation {} (must be in [0, 1)).",
                params.annual_degradation
            )));
        }
        Ok(Self {
            baseline_pct: params.baseline_pct,
            annual_degradation: params.annual_degradation,
            start: params.plant_start.unwrap_or(first_date),
        })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn years_since_start(&self, date: NaiveDate) -> f64 {
        (date - self.start).num_days() as f64 / DAYS_PER_YEAR
    }

    /// Budget PR (%) on `date`.
    pub fn at(&self, date: NaiveDate) -> f64 {
        self.baseline_pct * (1.0 - self.annual_degradation).powf(self.years_since_start(date))
    }
}
