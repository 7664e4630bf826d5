//! Write the statistics summary as JSON.
//!
//! The JSON is the machine-readable twin of the terminal statistics panel:
//! row count, period, trailing averages, points above budget per year and
//! GHI bucket counts. The schema is defined by `report::Summary`.

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::error::AppError;
use crate::io::export::write_atomic;
use crate::report::Summary;

#[derive(Debug, Serialize)]
struct SummaryFile<'a> {
    tool: &'static str,
    baseline_pct: f64,
    annual_degradation: f64,
    #[serde(flatten)]
    summary: &'a Summary,
}

/// Write a summary JSON file (all-or-nothing).
pub fn write_summary_json(
    path: &Path,
    summary: &Summary,
    baseline_pct: f64,
    annual_degradation: f64,
) -> Result<(), AppError> {
    let file = SummaryFile {
        tool: "solar-pr",
        baseline_pct,
        annual_degradation,
        summary,
    };
    write_atomic(path, |out| {
        serde_json::to_writer_pretty(&mut *out, &file)?;
        out.write_all(b"\n")
    })?;
    info!(path = %path.display(), "Summary JSON written");
    Ok(())
}
