//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the pipeline code stays clean and testable
//! - output changes are localized

use crate::io::ingest::SourceData;
use crate::merge::MergeOutput;
use crate::report::Summary;

/// Format the ingest/merge section: what was read and what the merge dropped.
pub fn format_ingest(pr: &SourceData, ghi: &SourceData, merge: &MergeOutput) -> String {
    let mut out = String::new();

    out.push_str("=== Data processing ===\n");
    for src in [pr, ghi] {
        out.push_str(&format!(
            "{:<4} files={} (skipped {}) | rows={} | records={} | malformed={}\n",
            src.kind.label(),
            src.files_read,
            src.skipped_files.len(),
            src.rows_read,
            src.readings.len(),
            src.row_errors.len(),
        ));
    }
    out.push_str(&format!(
        "Merged: {} rows | duplicates PR={} GHI={} | dropped PR-only={} GHI-only={}\n",
        merge.rows.len(),
        merge.pr_duplicates,
        merge.ghi_duplicates,
        merge.pr_only,
        merge.ghi_only,
    ));

    out
}

/// Format the statistics panel.
pub fn format_summary(summary: &Summary) -> String {
    let mut out = String::new();

    out.push_str("=== Solar PV Plant Performance ===\n");
    match (summary.first_date, summary.last_date) {
        (Some(first), Some(last)) => {
            out.push_str(&format!("Period: {first} .. {last} ({} rows)\n", summary.rows));
        }
        _ => {
            out.push_str("Period: (no rows in range)\n");
            return out;
        }
    }
    if let (Some(pr), Some(ghi)) = (summary.pr, summary.ghi) {
        out.push_str(&format!(
            "PR=[{:.1}, {:.1}]% | GHI=[{:.2}, {:.2}]\n",
            pr.min, pr.max, ghi.min, ghi.max
        ));
    }

    out.push_str("\nStatistics:\n");
    for t in &summary.trailing {
        out.push_str(&format!("{:>2}-day avg: {}\n", t.days, fmt_pct(t.mean_pr)));
    }

    if let Some(latest) = &summary.latest {
        out.push_str(&format!(
            "\nLatest ({}): PR={:.1}% budget={:.2}% | rolling 7/30/60 = {} / {} / {}\n",
            latest.date,
            latest.pr,
            latest.budget,
            fmt_pct(latest.avg7),
            fmt_pct(latest.avg30),
            fmt_pct(latest.avg60),
        ));
    }

    out.push_str("\nPoints above budget:\n");
    for y in &summary.above_budget_by_year {
        out.push_str(&format!("{}: {} / {}\n", y.year, y.above_budget, y.rows));
    }

    out.push_str("\nGHI buckets:\n");
    for b in &summary.buckets {
        out.push_str(&format!("{:<4} {}\n", b.label, b.rows));
    }

    out
}

fn fmt_pct(v: Option<f64>) -> String {
    match v {
        Some(v) if v.is_finite() => format!("{v:.1}%"),
        _ => "n/a".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BudgetParams, ConsolidatedRow};
    use crate::metrics::enrich;
    use crate::report::summarize;
    use chrono::NaiveDate;

    #[test]
    fn summary_text_lists_stats_and_years() {
        let rows = vec![
            ConsolidatedRow {
                date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
                ghi: 3.0,
                pr: 70.0,
            },
            ConsolidatedRow {
                date: NaiveDate::from_ymd_opt(2020, 1, 2).unwrap(),
                ghi: 5.0,
                pr: 75.0,
            },
        ];
        let enriched = enrich(&rows, &BudgetParams::default()).unwrap();
        let txt = format_summary(&summarize(&enriched));

        assert!(txt.contains("Period: 2020-01-01 .. 2020-01-02 (2 rows)\n"));
        assert!(txt.contains(" 7-day avg: 72.5%\n"));
        assert!(txt.contains("60-day avg: 72.5%\n"));
        assert!(txt.contains("rolling 7/30/60 = n/a / n/a / n/a"));
        assert!(txt.contains("2020: 1 / 2\n"));
        assert!(txt.contains("2-4  1\n"));
    }

    #[test]
    fn empty_summary_text() {
        let txt = format_summary(&summarize(&[]));
        assert!(txt.ends_with("Period: (no rows in range)\n"));
    }
}
