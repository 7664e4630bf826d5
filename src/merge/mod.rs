//! Date-keyed join of PR and GHI readings.
//!
//! Policy:
//! - each source is first collapsed to one value per date; when a date repeats,
//!   the later reading wins and the repeat is counted
//! - only dates present in **both** sources become rows; dates seen in a single
//!   source are dropped and counted (no partial rows)
//! - output is sorted ascending by date

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::domain::{ConsolidatedRow, MetricKind, Reading};
use crate::error::AppError;

/// Merge output: rows plus the counts of what the policy discarded.
#[derive(Debug, Clone)]
pub struct MergeOutput {
    pub rows: Vec<ConsolidatedRow>,
    pub pr_duplicates: usize,
    pub ghi_duplicates: usize,
    /// Dates with a PR reading but no GHI reading.
    pub pr_only: usize,
    /// Dates with a GHI reading but no PR reading.
    pub ghi_only: usize,
}

/// Join PR and GHI readings on date.
///
/// Readings whose `kind` does not match the side they were passed on are
/// ignored.
pub fn merge_readings(pr: &[Reading], ghi: &[Reading]) -> Result<MergeOutput, AppError> {
    let (pr_by_date, pr_duplicates) = index_by_date(pr, MetricKind::Pr);
    let (ghi_by_date, ghi_duplicates) = index_by_date(ghi, MetricKind::Ghi);

    // BTreeMap iteration is date-ordered, so rows come out sorted.
    let rows: Vec<ConsolidatedRow> = pr_by_date
        .iter()
        .filter_map(|(&date, &pr)| ghi_by_date.get(&date).map(|&ghi| ConsolidatedRow { date, ghi, pr }))
        .collect();

    let pr_only = pr_by_date.len() - rows.len();
    let ghi_only = ghi_by_date.len() - rows.len();

    if pr_duplicates > 0 || ghi_duplicates > 0 {
        warn!(pr_duplicates, ghi_duplicates, "Duplicate dates resolved (last reading wins)");
    }
    if pr_only > 0 || ghi_only > 0 {
        warn!(pr_only, ghi_only, "Dates missing from one source were dropped");
    }

    if rows.is_empty() {
        return Err(AppError::EmptyIntersection {
            pr_dates: pr_by_date.len(),
            ghi_dates: ghi_by_date.len(),
        });
    }

    info!(
        rows = rows.len(),
        first = %rows[0].date,
        last = %rows[rows.len() - 1].date,
        "Sources merged"
    );

    Ok(MergeOutput {
        rows,
        pr_duplicates,
        ghi_duplicates,
        pr_only,
        ghi_only,
    })
}

fn index_by_date(readings: &[Reading], kind: MetricKind) -> (BTreeMap<NaiveDate, f64>, usize) {
    let mut by_date = BTreeMap::new();
    let mut duplicates = 0usize;
    for r in readings.iter().filter(|r| r.kind == kind) {
        if by_date.insert(r.date, r.value).is_some() {
            duplicates += 1;
        }
    }
    (by_date, duplicates)
}

/// Collapse already-consolidated rows to one per date (last wins), sorted.
///
/// Used when a table is re-read from an export rather than built by a merge.
pub fn dedup_rows(rows: Vec<ConsolidatedRow>) -> (Vec<ConsolidatedRow>, usize) {
    let total = rows.len();
    let by_date: HashMap<NaiveDate, ConsolidatedRow> = rows.into_iter().map(|r| (r.date, r)).collect();
    let duplicates = total - by_date.len();
    let mut out: Vec<ConsolidatedRow> = by_date.into_values().collect();
    out.sort_by_key(|r| r.date);
    (out, duplicates)
}
