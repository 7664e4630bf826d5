//! Reporting utilities: the statistics panel for a processed table.
//!
//! Everything here is computed from the (optionally filtered) enriched rows,
//! so the numbers always describe what is shown on the chart.

pub mod format;

pub use format::{format_ingest, format_summary};

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

use crate::domain::{EnrichedRow, GhiBucket};

/// Calendar-day look-back windows for the trailing averages.
pub const TRAILING_DAYS: [i64; 3] = [7, 30, 60];

/// Mean PR over the calendar days ending at the latest date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrailingAverage {
    pub days: i64,
    /// Rows inside the window (gaps make this smaller than `days`).
    pub rows: usize,
    pub mean_pr: Option<f64>,
}

/// Points above the budget line in one calendar year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearCount {
    pub year: i32,
    pub above_budget: usize,
    pub rows: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketCount {
    pub bucket: GhiBucket,
    pub label: &'static str,
    pub rows: usize,
}

/// Min/max of a column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Span {
    pub min: f64,
    pub max: f64,
}

/// Derived values of the last row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Latest {
    pub date: NaiveDate,
    pub pr: f64,
    pub budget: f64,
    pub avg7: Option<f64>,
    pub avg30: Option<f64>,
    pub avg60: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub rows: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub pr: Option<Span>,
    pub ghi: Option<Span>,
    pub trailing: Vec<TrailingAverage>,
    pub above_budget_by_year: Vec<YearCount>,
    pub buckets: Vec<BucketCount>,
    pub latest: Option<Latest>,
}

/// Compute the summary for rows sorted ascending by date.
pub fn summarize(rows: &[EnrichedRow]) -> Summary {
    let latest = rows.last().map(|r| Latest {
        date: r.date(),
        pr: r.row.pr,
        budget: r.budget,
        avg7: r.rolling.avg7,
        avg30: r.rolling.avg30,
        avg60: r.rolling.avg60,
    });

    let trailing = match rows.last() {
        Some(last) => TRAILING_DAYS
            .iter()
            .map(|&days| trailing_average(rows, last.date(), days))
            .collect(),
        None => Vec::new(),
    };

    Summary {
        rows: rows.len(),
        first_date: rows.first().map(EnrichedRow::date),
        last_date: rows.last().map(EnrichedRow::date),
        pr: span(rows.iter().map(|r| r.row.pr)),
        ghi: span(rows.iter().map(|r| r.row.ghi)),
        trailing,
        above_budget_by_year: above_budget_by_year(rows),
        buckets: bucket_counts(rows),
        latest,
    }
}

/// Mean PR of rows with `date > latest - days`.
pub fn trailing_average(rows: &[EnrichedRow], latest: NaiveDate, days: i64) -> TrailingAverage {
    let cutoff = latest - Duration::days(days);
    let window: Vec<f64> = rows
        .iter()
        .filter(|r| r.date() > cutoff && r.date() <= latest)
        .map(|r| r.row.pr)
        .collect();
    let mean_pr = if window.is_empty() {
        None
    } else {
        Some(window.iter().sum::<f64>() / window.len() as f64)
    };
    TrailingAverage {
        days,
        rows: window.len(),
        mean_pr,
    }
}

pub fn above_budget_by_year(rows: &[EnrichedRow]) -> Vec<YearCount> {
    let mut by_year: BTreeMap<i32, (usize, usize)> = BTreeMap::new();
    for r in rows {
        let entry = by_year.entry(r.date().year()).or_default();
        if r.above_budget() {
            entry.0 += 1;
        }
        entry.1 += 1;
    }
    by_year
        .into_iter()
        .map(|(year, (above_budget, rows))| YearCount {
            year,
            above_budget,
            rows,
        })
        .collect()
}

fn bucket_counts(rows: &[EnrichedRow]) -> Vec<BucketCount> {
    GhiBucket::ALL
        .iter()
        .map(|&bucket| BucketCount {
            bucket,
            label: bucket.range_label(),
            rows: rows.iter().filter(|r| r.bucket == bucket).count(),
        })
        .collect()
}

fn span(values: impl Iterator<Item = f64>) -> Option<Span> {
    values.fold(None, |acc, v| match acc {
        None => Some(Span { min: v, max: v }),
        Some(s) => Some(Span {
            min: s.min.min(v),
            max: s.max.max(v),
        }),
    })
}
