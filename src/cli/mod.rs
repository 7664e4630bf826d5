//! Command-line parsing for the solar PR pipeline.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! pipeline code. Arguments are resolved into a `PipelineConfig` by `app`.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::domain::{DEFAULT_ANNUAL_DEGRADATION, DEFAULT_BASELINE_PCT, DateOrder};
use crate::io::ingest::parse_date;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "solar-pr", version, about = "Solar plant PR/GHI consolidation and performance report")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// More logging (debug level).
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Less logging (warnings only).
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Read partitions, merge, compute metrics, export CSV and render the chart.
    Run(RunArgs),
    /// Read partitions, merge and export the consolidated CSV only.
    Consolidate(SourceArgs),
    /// Recompute the report from a previously exported consolidated CSV.
    Report(ReportArgs),
}

/// Where the partitioned source data lives and how to read it.
#[derive(Debug, Args, Clone)]
pub struct SourceArgs {
    /// Data root holding the `PR/` and `GHI/` partition trees.
    #[arg(long, env = "SOLAR_DATA_ROOT", default_value = "data")]
    pub data_root: PathBuf,

    /// Directory name of the PR tree under the data root.
    #[arg(long, env = "SOLAR_PR_DIR", default_value = "PR")]
    pub pr_dir: String,

    /// Directory name of the GHI tree under the data root.
    #[arg(long, env = "SOLAR_GHI_DIR", default_value = "GHI")]
    pub ghi_dir: String,

    /// Extension of partition files.
    #[arg(long, default_value = "csv")]
    pub extension: String,

    /// Date column name (case-insensitive).
    #[arg(long, default_value = "Date")]
    pub date_column: String,

    /// PR column name (case-insensitive).
    #[arg(long, default_value = "PR")]
    pub pr_column: String,

    /// GHI column name (case-insensitive).
    #[arg(long, default_value = "GHI")]
    pub ghi_column: String,

    /// Read `NN/NN/YYYY` source dates as day/month (default is month/day).
    #[arg(long, env = "SOLAR_DAY_FIRST")]
    pub day_first: bool,

    /// Consolidated CSV destination.
    #[arg(short, long, env = "SOLAR_OUTPUT", default_value = "processed_solar_data.csv")]
    pub output: PathBuf,
}

/// Metric, filter and presentation options shared by `run` and `report`.
#[derive(Debug, Args, Clone)]
pub struct AnalysisArgs {
    /// First date to include (inclusive).
    #[arg(long, value_parser = parse_date_arg)]
    pub start: Option<NaiveDate>,

    /// Last date to include (inclusive).
    #[arg(long, value_parser = parse_date_arg)]
    pub end: Option<NaiveDate>,

    /// Budget PR (%) at the plant start date.
    #[arg(long, env = "SOLAR_BASELINE_PCT", default_value_t = DEFAULT_BASELINE_PCT)]
    pub baseline: f64,

    /// Annual degradation as a fraction (0.008 = 0.8%/yr).
    #[arg(long, env = "SOLAR_DEGRADATION", default_value_t = DEFAULT_ANNUAL_DEGRADATION)]
    pub degradation: f64,

    /// Degradation reference date (defaults to the first date in the data).
    #[arg(long, env = "SOLAR_PLANT_START", value_parser = parse_date_arg)]
    pub plant_start: Option<NaiveDate>,

    /// SVG chart destination.
    #[arg(long, env = "SOLAR_CHART", default_value = "solar_performance_analysis.svg")]
    pub chart: PathBuf,

    /// Skip the SVG chart.
    #[arg(long)]
    pub no_chart: bool,

    /// Chart width (pixels).
    #[arg(long, default_value_t = 1500)]
    pub chart_width: u32,

    /// Chart height (pixels).
    #[arg(long, default_value_t = 1000)]
    pub chart_height: u32,

    /// Write the statistics summary as JSON.
    #[arg(long = "summary-json", value_name = "JSON")]
    pub summary_json: Option<PathBuf>,

    /// Render an ASCII plot in the terminal.
    #[arg(long)]
    pub plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}

#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub analysis: AnalysisArgs,
}

#[derive(Debug, Args, Clone)]
pub struct ReportArgs {
    /// Consolidated CSV produced by `solar-pr run` or `solar-pr consolidate`.
    #[arg(short, long, value_name = "CSV")]
    pub input: PathBuf,

    #[command(flatten)]
    pub analysis: AnalysisArgs,
}

fn parse_date_arg(s: &str) -> Result<NaiveDate, String> {
    parse_date(s.trim(), DateOrder::MonthFirst).map_err(|_| format!("invalid date '{s}' (expected YYYY-MM-DD)"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_run_with_range() {
        let cli = Cli::try_parse_from(["solar-pr", "run", "--start", "2020-01-01", "--end", "2020-12-31", "--no-chart"])
            .unwrap();
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.analysis.start, NaiveDate::from_ymd_opt(2020, 1, 1));
        assert_eq!(args.analysis.end, NaiveDate::from_ymd_opt(2020, 12, 31));
        assert!(args.analysis.no_chart);
    }

    #[test]
    fn day_first_is_opt_in() {
        let cli = Cli::try_parse_from(["solar-pr", "consolidate"]).unwrap();
        let Command::Consolidate(args) = cli.command else {
            panic!("expected consolidate");
        };
        assert!(!args.day_first);

        let cli = Cli::try_parse_from(["solar-pr", "consolidate", "--day-first"]).unwrap();
        let Command::Consolidate(args) = cli.command else {
            panic!("expected consolidate");
        };
        assert!(args.day_first);
    }

    #[test]
    fn rejects_bad_date() {
        assert!(Cli::try_parse_from(["solar-pr", "run", "--start", "tomorrow"]).is_err());
    }

    #[test]
    fn report_requires_input() {
        assert!(Cli::try_parse_from(["solar-pr", "report"]).is_err());
        let cli = Cli::try_parse_from(["solar-pr", "-q", "report", "--input", "x.csv"]).unwrap();
        assert!(cli.quiet);
    }
}
