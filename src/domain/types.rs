//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - passed between pipeline stages by value
//! - exported to CSV/JSON
//! - reloaded later for reporting

use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Serialize;

/// Which telemetry series a reading belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    /// Performance Ratio, in percent.
    Pr,
    /// Global Horizontal Irradiance.
    Ghi,
}

impl MetricKind {
    pub fn label(self) -> &'static str {
        match self {
            MetricKind::Pr => "PR",
            MetricKind::Ghi => "GHI",
        }
    }

    /// Whether `value` is a plausible reading for this metric.
    ///
    /// PR is a percentage and must lie in `[0, 100]`; GHI must be non-negative.
    pub fn accepts(self, value: f64) -> bool {
        if !value.is_finite() || value < 0.0 {
            return false;
        }
        match self {
            MetricKind::Pr => value <= 100.0,
            MetricKind::Ghi => true,
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One dated observation from a source file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub date: NaiveDate,
    pub value: f64,
    pub kind: MetricKind,
}

/// One row of the merged dataset: a date present in both PR and GHI sources.
///
/// Field order is the export column order (`Date, GHI, PR`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConsolidatedRow {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "GHI")]
    pub ghi: f64,
    #[serde(rename = "PR")]
    pub pr: f64,
}

/// Trailing PR means over 7, 30 and 60 rows.
///
/// A window is `None` until enough history exists to fill it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct RollingStats {
    pub avg7: Option<f64>,
    pub avg30: Option<f64>,
    pub avg60: Option<f64>,
}

/// Presentation class for a GHI value.
///
/// Intervals are half-open: `[0, 2)`, `[2, 4)`, `[4, 6)`, `[6, ∞)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GhiBucket {
    Low,
    Mid,
    High,
    VeryHigh,
}

impl GhiBucket {
    pub const ALL: [GhiBucket; 4] = [GhiBucket::Low, GhiBucket::Mid, GhiBucket::High, GhiBucket::VeryHigh];

    pub fn from_ghi(ghi: f64) -> Self {
        if ghi < 2.0 {
            GhiBucket::Low
        } else if ghi < 4.0 {
            GhiBucket::Mid
        } else if ghi < 6.0 {
            GhiBucket::High
        } else {
            GhiBucket::VeryHigh
        }
    }

    /// Legend label.
    pub fn range_label(self) -> &'static str {
        match self {
            GhiBucket::Low => "<2",
            GhiBucket::Mid => "2-4",
            GhiBucket::High => "4-6",
            GhiBucket::VeryHigh => ">6",
        }
    }

    /// Chart colour as RGB (navy, light blue, orange, brown).
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            GhiBucket::Low => (0, 0, 128),
            GhiBucket::Mid => (173, 216, 230),
            GhiBucket::High => (255, 165, 0),
            GhiBucket::VeryHigh => (165, 42, 42),
        }
    }
}

/// A consolidated row with every derived metric attached.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnrichedRow {
    pub row: ConsolidatedRow,
    pub rolling: RollingStats,
    /// Expected PR (%) on this date after degradation.
    pub budget: f64,
    pub bucket: GhiBucket,
}

impl EnrichedRow {
    pub fn date(&self) -> NaiveDate {
        self.row.date
    }

    pub fn above_budget(&self) -> bool {
        self.row.pr > self.budget
    }
}

/// How ambiguous `NN/NN/YYYY` and `NN-NN-YYYY` dates are read.
///
/// ISO forms (`YYYY-MM-DD`, `YYYY/MM/DD`) are unambiguous and accepted either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateOrder {
    /// `02/01/2020` is February 1st.
    #[default]
    MonthFirst,
    /// `02/01/2020` is January 2nd.
    DayFirst,
}

/// Column names looked up in every source file (case-insensitive), plus how
/// the date column is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnNames {
    pub date: String,
    pub pr: String,
    pub ghi: String,
    pub date_order: DateOrder,
}

impl ColumnNames {
    pub fn value_column(&self, kind: MetricKind) -> &str {
        match kind {
            MetricKind::Pr => &self.pr,
            MetricKind::Ghi => &self.ghi,
        }
    }
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            date: "Date".to_string(),
            pr: "PR".to_string(),
            ghi: "GHI".to_string(),
            date_order: DateOrder::default(),
        }
    }
}

/// An input the pipeline reads from; named in `SourceUnavailable` errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// One metric's partition tree.
    Metric(MetricKind),
    /// A previously exported `Date,GHI,PR` table.
    Consolidated,
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputKind::Metric(kind) => write!(f, "{kind} files"),
            InputKind::Consolidated => f.write_str("consolidated CSV"),
        }
    }
}

/// Where partition files live under the data root.
///
/// `<root>/<metric dir>/<partition>/<file>.<extension>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionLayout {
    pub pr_dir: String,
    pub ghi_dir: String,
    pub extension: String,
}

impl PartitionLayout {
    pub fn metric_dir(&self, kind: MetricKind) -> &str {
        match kind {
            MetricKind::Pr => &self.pr_dir,
            MetricKind::Ghi => &self.ghi_dir,
        }
    }
}

impl Default for PartitionLayout {
    fn default() -> Self {
        Self {
            pr_dir: "PR".to_string(),
            ghi_dir: "GHI".to_string(),
            extension: "csv".to_string(),
        }
    }
}

/// Parameters of the degrading budget line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BudgetParams {
    /// Budget PR (%) on the plant start date.
    pub baseline_pct: f64,
    /// Fractional loss per year (0.008 = 0.8%/yr).
    pub annual_degradation: f64,
    /// Reference date for degradation; `None` means the first date in the dataset.
    pub plant_start: Option<NaiveDate>,
}

pub const DEFAULT_BASELINE_PCT: f64 = 73.9;
pub const DEFAULT_ANNUAL_DEGRADATION: f64 = 0.008;

impl Default for BudgetParams {
    fn default() -> Self {
        Self {
            baseline_pct: DEFAULT_BASELINE_PCT,
            annual_degradation: DEFAULT_ANNUAL_DEGRADATION,
            plant_start: None,
        }
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus `.env`/environment defaults).
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub data_root: PathBuf,
    pub layout: PartitionLayout,
    pub columns: ColumnNames,

    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,

    pub budget: BudgetParams,

    pub output_csv: Option<PathBuf>,
    pub summary_json: Option<PathBuf>,
    pub chart: Option<PathBuf>,
    pub chart_width: u32,
    pub chart_height: u32,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("data"),
            layout: PartitionLayout::default(),
            columns: ColumnNames::default(),
            start: None,
            end: None,
            budget: BudgetParams::default(),
            output_csv: Some(PathBuf::from("processed_solar_data.csv")),
            summary_json: None,
            chart: Some(PathBuf::from("solar_performance_analysis.svg")),
            chart_width: 1500,
            chart_height: 1000,
            plot: false,
            plot_width: 100,
            plot_height: 25,
        }
    }
}
