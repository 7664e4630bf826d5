//! Plotters-powered performance chart, written as SVG.
//!
//! Layout follows the classic PR report:
//! - daily PR scatter, coloured by GHI bucket
//! - 30-row rolling average (red)
//! - degrading budget line (green, dashed)
//! - statistics panel in the upper-left corner
//!
//! The x axis is "days since the first row" so the chart needs no date-aware
//! coordinate support; tick labels are converted back to dates.

use std::io::Write;
use std::path::Path;

use chrono::{Duration, NaiveDate};
use plotters::prelude::*;
use tracing::info;

use crate::domain::{EnrichedRow, GhiBucket};
use crate::error::AppError;
use crate::io::export::write_atomic;
use crate::report::Summary;

/// Number of equal slices the budget line is cut into; every other one is drawn.
const BUDGET_DASHES: usize = 120;

#[derive(Debug, Clone)]
pub struct ChartOptions {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            width: 1500,
            height: 1000,
            title: "Solar PV Plant Performance Analysis".to_string(),
        }
    }
}

/// Render the chart and write it to `path` (all-or-nothing).
pub fn render_svg_chart(
    path: &Path,
    rows: &[EnrichedRow],
    summary: &Summary,
    options: &ChartOptions,
) -> Result<(), AppError> {
    let svg = render_svg(rows, summary, options)
        .map_err(|e| AppError::write_failure(path, std::io::Error::other(e.to_string())))?;
    write_atomic(path, |out| out.write_all(svg.as_bytes()))?;
    info!(path = %path.display(), rows = rows.len(), "Chart written");
    Ok(())
}

/// Render the chart to an SVG document.
pub fn render_svg(
    rows: &[EnrichedRow],
    summary: &Summary,
    options: &ChartOptions,
) -> Result<String, Box<dyn std::error::Error>> {
    let (Some(first), Some(last)) = (rows.first(), rows.last()) else {
        return Err("no rows to plot".into());
    };

    let origin = first.date();
    let x_of = |date: NaiveDate| (date - origin).num_days() as f64;
    let x_max = x_of(last.date()).max(1.0);

    let budget: Vec<(f64, f64)> = rows.iter().map(|r| (x_of(r.date()), r.budget)).collect();
    let rolling: Vec<(f64, f64)> = rows
        .iter()
        .filter_map(|r| r.rolling.avg30.map(|v| (x_of(r.date()), v)))
        .collect();

    let (y_min, y_max) = y_bounds(rows);

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (options.width, options.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(&options.title, ("sans-serif", 28))
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(70)
            .build_cartesian_2d(0.0..x_max, y_min..y_max)?;

        chart
            .configure_mesh()
            .x_desc("Date")
            .y_desc("Performance Ratio (%)")
            .x_labels(12)
            .y_labels(10)
            .x_label_formatter(&|v| (origin + Duration::days(v.round() as i64)).format("%Y-%m-%d").to_string())
            .y_label_formatter(&|v| format!("{v:.0}"))
            .light_line_style(RGBColor(235, 235, 235))
            .draw()?;

        for bucket in GhiBucket::ALL {
            let (r, g, b) = bucket.rgb();
            let color = RGBColor(r, g, b);
            let points: Vec<(f64, f64)> = rows
                .iter()
                .filter(|row| row.bucket == bucket)
                .map(|row| (x_of(row.date()), row.row.pr))
                .collect();
            if points.is_empty() {
                continue;
            }
            chart
                .draw_series(points.into_iter().map(|p| Circle::new(p, 3, color.mix(0.6).filled())))?
                .label(format!("GHI: {}", bucket.range_label()))
                .legend(move |(x, y)| Circle::new((x, y), 4, color.filled()));
        }

        if !rolling.is_empty() {
            chart
                .draw_series(LineSeries::new(rolling, RED.stroke_width(2)))?
                .label("30-day Moving Average")
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED.stroke_width(2)));
        }

        let green = RGBColor(0, 128, 0);
        chart
            .draw_series(
                dash_segments(&budget, x_max, BUDGET_DASHES)
                    .into_iter()
                    .map(|seg| PathElement::new(seg, green.stroke_width(2))),
            )?
            .label("Budget Line")
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], green.stroke_width(2)));

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.85))
            .border_style(BLACK)
            .draw()?;

        let text_style = ("sans-serif", 15).into_font();
        for (i, line) in stats_lines(summary).iter().enumerate() {
            let y = 110 + 20 * i as i32;
            root.draw(&Text::new(line.as_str(), (110, y), text_style.clone()))?;
        }

        root.present()?;
    }

    Ok(svg)
}

/// Text of the statistics panel.
pub fn stats_lines(summary: &Summary) -> Vec<String> {
    let mut lines = vec!["Statistics:".to_string()];
    for t in &summary.trailing {
        let value = t.mean_pr.map(|v| format!("{v:.1}%")).unwrap_or_else(|| "n/a".to_string());
        lines.push(format!("{}-day avg: {value}", t.days));
    }
    lines.push(String::new());
    lines.push("Points above budget:".to_string());
    for y in &summary.above_budget_by_year {
        lines.push(format!("{}: {}", y.year, y.above_budget));
    }
    lines
}

fn y_bounds(rows: &[EnrichedRow]) -> (f64, f64) {
    let (lo, hi) = rows
        .iter()
        .flat_map(|r| [r.row.pr, r.budget])
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let pad = ((hi - lo) * 0.05).max(1.0);
    ((lo - pad).max(0.0), hi + pad)
}

/// Cut a polyline into `n` equal x-slices and keep every other one.
fn dash_segments(points: &[(f64, f64)], x_max: f64, n: usize) -> Vec<Vec<(f64, f64)>> {
    if points.is_empty() || n == 0 {
        return Vec::new();
    }
    let step = x_max / n as f64;
    (0..n)
        .step_by(2)
        .map(|i| {
            let a = i as f64 * step;
            let b = a + step;
            vec![(a, interpolate(points, a)), (b, interpolate(points, b))]
        })
        .collect()
}

/// Linear interpolation on x-sorted points, clamped to the end values.
fn interpolate(points: &[(f64, f64)], x: f64) -> f64 {
    let idx = points.partition_point(|&(px, _)| px < x);
    match (idx.checked_sub(1).and_then(|i| points.get(i)), points.get(idx)) {
        (Some(&(x0, y0)), Some(&(x1, y1))) if x1 > x0 => y0 + (y1 - y0) * (x - x0) / (x1 - x0),
        (_, Some(&(_, y))) | (Some(&(_, y)), None) => y,
        (None, None) => f64::NAN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BudgetParams, ConsolidatedRow};
    use crate::metrics::enrich;
    use crate::report::summarize;
    use tempfile::TempDir;

    fn table(n: i64) -> Vec<EnrichedRow> {
        let start = NaiveDate::from_ymd_opt(2019, 7, 1).unwrap();
        let rows: Vec<ConsolidatedRow> = (0..n)
            .map(|i| ConsolidatedRow {
                date: start + Duration::days(i),
                ghi: (i % 8) as f64,
                pr: 65.0 + (i % 15) as f64,
            })
            .collect();
        enrich(&rows, &BudgetParams::default()).unwrap()
    }

    #[test]
    fn renders_svg_with_legend() {
        let rows = table(90);
        let svg = render_svg(&rows, &summarize(&rows), &ChartOptions::default()).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Budget Line"));
        assert!(svg.contains("30-day Moving Average"));
        assert!(svg.contains("GHI: 2-4"));
    }

    #[test]
    fn empty_rows_are_an_error() {
        assert!(render_svg(&[], &summarize(&[]), &ChartOptions::default()).is_err());
    }

    #[test]
    fn write_to_missing_directory_fails() {
        let tmp = TempDir::new().unwrap();
        let rows = table(3);
        let path = tmp.path().join("missing/chart.svg");
        let err = render_svg_chart(&path, &rows, &summarize(&rows), &ChartOptions::default()).unwrap_err();
        assert!(matches!(err, AppError::WriteFailure { .. }));
    }

    #[test]
    fn stats_panel_lines() {
        let rows = table(10);
        let lines = stats_lines(&summarize(&rows));
        assert_eq!(lines[0], "Statistics:");
        assert!(lines[1].starts_with("7-day avg: "));
        assert!(lines.contains(&"Points above budget:".to_string()));
        assert!(lines.last().unwrap().starts_with("2019: "));
    }

    #[test]
    fn interpolation_clamps_and_blends() {
        let pts = [(0.0, 10.0), (10.0, 20.0)];
        assert_eq!(interpolate(&pts, -1.0), 10.0);
        assert_eq!(interpolate(&pts, 5.0), 15.0);
        assert_eq!(interpolate(&pts, 12.0), 20.0);
        assert_eq!(dash_segments(&pts, 10.0, 4).len(), 2);
    }
}
