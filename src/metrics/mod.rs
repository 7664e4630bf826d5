//! Derived per-row metrics: rolling PR means, budget line, GHI bucket.

pub mod budget;
pub mod rolling;

pub use budget::BudgetLine;
pub use rolling::{WINDOWS, trailing_mean};

use tracing::debug;

use crate::domain::{BudgetParams, ConsolidatedRow, EnrichedRow, GhiBucket, RollingStats};
use crate::error::AppError;

/// Attach rolling stats, budget and bucket to every row.
///
/// `rows` must be sorted ascending by date (merge output is). The input is not
/// modified; an empty input yields an empty output.
pub fn enrich(rows: &[ConsolidatedRow], params: &BudgetParams) -> Result<Vec<EnrichedRow>, AppError> {
    let Some(first) = rows.first() else {
        return Ok(Vec::new());
    };
    let budget = BudgetLine::new(params, first.date)?;

    let pr: Vec<f64> = rows.iter().map(|r| r.pr).collect();
    let [w7, w30, w60] = WINDOWS;
    let avg7 = trailing_mean(&pr, w7);
    let avg30 = trailing_mean(&pr, w30);
    let avg60 = trailing_mean(&pr, w60);

    let enriched: Vec<EnrichedRow> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| EnrichedRow {
            row: *row,
            rolling: RollingStats {
                avg7: avg7[i],
                avg30: avg30[i],
                avg60: avg60[i],
            },
            budget: budget.at(row.date),
            bucket: GhiBucket::from_ghi(row.ghi),
        })
        .collect();

    debug!(rows = enriched.len(), budget_start = %budget.start(), "Metrics computed");
    Ok(enriched)
}
