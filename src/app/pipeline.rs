//! Shared pipeline logic used by every subcommand.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! partitions -> read PR/GHI -> merge -> metrics -> range filter -> summary
//!
//! The functions here compute; writing files and printing is left to `app`.

use tracing::info;

use crate::domain::{BudgetParams, ConsolidatedRow, EnrichedRow, MetricKind, PipelineConfig};
use crate::error::AppError;
use crate::filter::{DateRange, filter_range};
use crate::io::ingest::{Loader, SourceData, read_source};
use crate::merge::{MergeOutput, merge_readings};
use crate::metrics::enrich;
use crate::report::{Summary, summarize};

/// Sources read and merged into one table.
#[derive(Debug, Clone)]
pub struct Consolidation {
    pub pr: SourceData,
    pub ghi: SourceData,
    pub merge: MergeOutput,
}

/// Metrics computed over a consolidated table, then restricted to a range.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Every consolidated row with its metrics.
    pub enriched: Vec<EnrichedRow>,
    /// Rows inside the requested range, in date order.
    pub filtered: Vec<EnrichedRow>,
    pub summary: Summary,
}

/// All computed outputs of a single `solar-pr run`.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub consolidation: Consolidation,
    pub analysis: Analysis,
}

impl RunOutput {
    /// Rows to export: the filtered table without derived columns.
    pub fn export_rows(&self) -> impl Iterator<Item = &ConsolidatedRow> {
        self.analysis.filtered.iter().map(|r| &r.row)
    }
}

/// Read both metrics through `loader` and merge them by date.
pub fn consolidate(config: &PipelineConfig, loader: &dyn Loader) -> Result<Consolidation, AppError> {
    let pr = read_source(&loader.partitions(MetricKind::Pr)?, &config.columns)?;
    let ghi = read_source(&loader.partitions(MetricKind::Ghi)?, &config.columns)?;
    let merge = merge_readings(&pr.readings, &ghi.readings)?;

    info!(rows = merge.rows.len(), "Sources consolidated");
    Ok(Consolidation { pr, ghi, merge })
}

/// Compute metrics over the whole table, then filter to `range`.
///
/// Metrics are computed before filtering so the budget start date and the
/// rolling windows do not shift with the requested range.
pub fn analyze(rows: &[ConsolidatedRow], budget: &BudgetParams, range: &DateRange) -> Result<Analysis, AppError> {
    let enriched = enrich(rows, budget)?;
    let filtered = filter_range(&enriched, range);
    let summary = summarize(&filtered);

    info!(
        rows = enriched.len(),
        in_range = filtered.len(),
        start = %range.start(),
        end = %range.end(),
        "Metrics computed"
    );
    Ok(Analysis {
        enriched,
        filtered,
        summary,
    })
}

/// Execute the full pipeline and return the computed outputs.
pub fn run_pipeline(config: &PipelineConfig, loader: &dyn Loader) -> Result<RunOutput, AppError> {
    // Validate the range before touching any file.
    let range = DateRange::from_bounds(config.start, config.end)?;

    let consolidation = consolidate(config, loader)?;
    let analysis = analyze(&consolidation.merge.rows, &config.budget, &range)?;

    Ok(RunOutput {
        consolidation,
        analysis,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::GhiBucket;
    use crate::io::ingest::ListLoader;
    use chrono::NaiveDate;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn fixture(tmp: &TempDir, pr: &str, ghi: &str) -> ListLoader {
        let pr_path: PathBuf = tmp.path().join("pr.csv");
        let ghi_path: PathBuf = tmp.path().join("ghi.csv");
        fs::write(&pr_path, pr).unwrap();
        fs::write(&ghi_path, ghi).unwrap();
        ListLoader {
            pr: vec![pr_path],
            ghi: vec![ghi_path],
        }
    }

    #[test]
    fn two_day_scenario() {
        let tmp = TempDir::new().unwrap();
        let loader = fixture(
            &tmp,
            "Date,PR\n2020-01-01,70\n2020-01-02,75\n",
            "Date,GHI\n2020-01-01,3.0\n2020-01-02,5.0\n",
        );

        let run = run_pipeline(&PipelineConfig::default(), &loader).unwrap();
        let rows = &run.analysis.filtered;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].bucket, GhiBucket::Mid);
        assert_eq!(rows[1].bucket, GhiBucket::High);
        assert!(rows.iter().all(|r| r.rolling.avg7.is_none()));
        assert!((rows[0].budget - 73.9).abs() < 1e-9);
        assert!((rows[1].budget - 73.9).abs() < 0.01);
        assert_eq!(run.export_rows().count(), 2);
    }

    #[test]
    fn range_is_checked_before_reading() {
        let config = PipelineConfig {
            start: Some(d(2020, 2, 1)),
            end: Some(d(2020, 1, 1)),
            ..PipelineConfig::default()
        };
        // The loader points at nothing; the range error must win.
        let err = run_pipeline(&config, &ListLoader::default()).unwrap_err();
        assert!(matches!(err, AppError::InvalidRange { .. }));
    }

    #[test]
    fn filter_keeps_metrics_from_full_table() {
        let tmp = TempDir::new().unwrap();
        let mut pr = String::from("Date,PR\n");
        let mut ghi = String::from("Date,GHI\n");
        for day in 1..=10 {
            pr.push_str(&format!("2020-01-{day:02},{}\n", 70 + day));
            ghi.push_str(&format!("2020-01-{day:02},4.5\n"));
        }
        let loader = fixture(&tmp, &pr, &ghi);
        let config = PipelineConfig {
            start: Some(d(2020, 1, 9)),
            end: Some(d(2020, 1, 10)),
            ..PipelineConfig::default()
        };

        let run = run_pipeline(&config, &loader).unwrap();
        assert_eq!(run.analysis.enriched.len(), 10);
        assert_eq!(run.analysis.filtered.len(), 2);
        // avg7 at Jan 9 covers Jan 3..=9 of the full table.
        assert!((run.analysis.filtered[0].rolling.avg7.unwrap() - 76.0).abs() < 1e-9);
        assert_eq!(run.analysis.summary.rows, 2);
    }

    #[test]
    fn disjoint_sources_fail_with_empty_intersection() {
        let tmp = TempDir::new().unwrap();
        let loader = fixture(&tmp, "Date,PR\n2020-01-01,70\n", "Date,GHI\n2020-01-02,3.0\n");
        let err = run_pipeline(&PipelineConfig::default(), &loader).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
