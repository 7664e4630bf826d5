//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` defaults and sets up logging
//! - parses CLI arguments
//! - runs the consolidation/metrics pipeline
//! - prints reports/plots
//! - writes the CSV export, summary JSON and chart

use std::path::PathBuf;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{AnalysisArgs, Cli, Command, ReportArgs, RunArgs, SourceArgs};
use crate::domain::{BudgetParams, ColumnNames, DateOrder, PartitionLayout, PipelineConfig};
use crate::error::AppError;
use crate::filter::DateRange;
use crate::io::ingest::DirectoryLoader;
use crate::plot::ChartOptions;

pub mod pipeline;

use pipeline::Analysis;

/// Entry point for the `solar-pr` binary.
pub fn run() -> Result<(), AppError> {
    // Missing .env is fine; real environment variables still apply.
    dotenvy::dotenv().ok();

    // We want `solar-pr --start ...` to behave like `solar-pr run --start ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = Cli::parse_from(argv);

    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Command::Run(args) => handle_run(args),
        Command::Consolidate(args) => handle_consolidate(args),
        Command::Report(args) => handle_report(args),
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let filter = match (verbose, quiet) {
        (true, _) => EnvFilter::new("debug"),
        (_, true) => EnvFilter::new("warn"),
        _ => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(filter);

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry().with(stderr_layer).try_init();
}

fn handle_run(args: RunArgs) -> Result<(), AppError> {
    let config = with_analysis(source_config(&args.source), &args.analysis);
    let loader = DirectoryLoader::new(&config.data_root, config.layout.clone());
    let run = pipeline::run_pipeline(&config, &loader)?;

    let c = &run.consolidation;
    println!("{}", crate::report::format_ingest(&c.pr, &c.ghi, &c.merge));

    if let Some(path) = &config.output_csv {
        crate::io::export::write_consolidated_csv(path, run.export_rows())?;
    }

    present(&config, &run.analysis)
}

fn handle_consolidate(args: SourceArgs) -> Result<(), AppError> {
    let config = source_config(&args);
    let loader = DirectoryLoader::new(&config.data_root, config.layout.clone());
    let c = pipeline::consolidate(&config, &loader)?;

    println!("{}", crate::report::format_ingest(&c.pr, &c.ghi, &c.merge));

    if let Some(path) = &config.output_csv {
        crate::io::export::write_consolidated_csv(path, &c.merge.rows)?;
    }
    Ok(())
}

fn handle_report(args: ReportArgs) -> Result<(), AppError> {
    let config = with_analysis(PipelineConfig::default(), &args.analysis);
    let range = DateRange::from_bounds(config.start, config.end)?;

    let table = crate::io::export::read_consolidated_csv(&args.input)?;
    println!(
        "Loaded {} rows from {} (malformed={}, duplicates={})\n",
        table.rows.len(),
        args.input.display(),
        table.row_errors.len(),
        table.duplicates
    );

    let analysis = pipeline::analyze(&table.rows, &config.budget, &range)?;
    present(&config, &analysis)
}

/// Print the statistics panel and write the optional outputs.
fn present(config: &PipelineConfig, analysis: &Analysis) -> Result<(), AppError> {
    println!("{}", crate::report::format_summary(&analysis.summary));

    if config.plot {
        let plot = crate::plot::render_ascii_plot(&analysis.filtered, config.plot_width, config.plot_height);
        println!("{plot}");
    }

    if let Some(path) = &config.summary_json {
        crate::io::summary::write_summary_json(
            path,
            &analysis.summary,
            config.budget.baseline_pct,
            config.budget.annual_degradation,
        )?;
    }

    if let Some(path) = &config.chart {
        if analysis.filtered.is_empty() {
            warn!(path = %path.display(), "No rows in range; chart skipped");
        } else {
            let options = ChartOptions {
                width: config.chart_width,
                height: config.chart_height,
                ..ChartOptions::default()
            };
            crate::plot::render_svg_chart(path, &analysis.filtered, &analysis.summary, &options)?;
        }
    }

    info!(rows = analysis.filtered.len(), "Done");
    Ok(())
}

/// Resolve source arguments into a config; analysis fields keep their defaults.
pub fn source_config(args: &SourceArgs) -> PipelineConfig {
    PipelineConfig {
        data_root: args.data_root.clone(),
        layout: PartitionLayout {
            pr_dir: args.pr_dir.clone(),
            ghi_dir: args.ghi_dir.clone(),
            extension: args.extension.trim_start_matches('.').to_string(),
        },
        columns: ColumnNames {
            date: args.date_column.clone(),
            pr: args.pr_column.clone(),
            ghi: args.ghi_column.clone(),
            date_order: if args.day_first {
                DateOrder::DayFirst
            } else {
                DateOrder::MonthFirst
            },
        },
        output_csv: Some(args.output.clone()),
        ..PipelineConfig::default()
    }
}

/// Apply metric, filter and presentation arguments to a config.
pub fn with_analysis(config: PipelineConfig, args: &AnalysisArgs) -> PipelineConfig {
    PipelineConfig {
        start: args.start,
        end: args.end,
        budget: BudgetParams {
            baseline_pct: args.baseline,
            annual_degradation: args.degradation,
            plant_start: args.plant_start,
        },
        summary_json: args.summary_json.clone(),
        chart: (!args.no_chart).then(|| args.chart.clone()),
        chart_width: args.chart_width,
        chart_height: args.chart_height,
        plot: args.plot,
        plot_width: args.width,
        plot_height: args.height,
        ..config
    }
}

/// Rewrite argv so bare flags default to `solar-pr run`.
///
/// Rules:
/// - `solar-pr`                          -> `solar-pr run`
/// - `solar-pr --start 2020-01-01 ...`   -> `solar-pr run --start 2020-01-01 ...`
/// - `solar-pr -v --plot`                -> `solar-pr -v run --plot`
/// - `solar-pr --help/--version/-h/-V`   -> unchanged
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let is_global = |a: &str| matches!(a, "-v" | "--verbose" | "-q" | "--quiet");

    let Some(pos) = argv.iter().skip(1).position(|a| !is_global(a)).map(|p| p + 1) else {
        argv.push("run".to_string());
        return argv;
    };

    let first = argv[pos].as_str();
    let is_top_level_help_or_version = matches!(first, "-h" | "--help" | "-V" | "--version" | "help");
    let is_subcommand = matches!(first, "run" | "consolidate" | "report");
    if is_top_level_help_or_version || is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "run flags".
    if first.starts_with('-') {
        argv.insert(pos, "run".to_string());
    }

    // Otherwise, leave as-is and let clap report the unknown subcommand.
    argv
}
