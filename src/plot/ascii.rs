//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - daily PR: `o`
//! - budget line: `-`
//! - 30-row rolling average: `*`

use chrono::NaiveDate;

use crate::domain::EnrichedRow;

/// Render PR, budget and rolling average for rows sorted by date.
pub fn render_ascii_plot(rows: &[EnrichedRow], width: usize, height: usize) -> String {
    let (Some(first), Some(last)) = (rows.first(), rows.last()) else {
        return "Plot: (no rows)\n".to_string();
    };

    let width = width.max(10);
    let height = height.max(5);

    let origin = first.date();
    let x_of = |date: NaiveDate| (date - origin).num_days() as f64;
    let (t_min, t_max) = widen_if_flat(0.0, x_of(last.date()));

    let budget: Vec<(f64, f64)> = rows.iter().map(|r| (x_of(r.date()), r.budget)).collect();
    let rolling: Vec<(f64, f64)> = rows
        .iter()
        .filter_map(|r| r.rolling.avg30.map(|v| (x_of(r.date()), v)))
        .collect();

    let (y_min, y_max) = y_range(rows, &rolling);
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Lines first so points overlay them.
    draw_curve(&mut grid, &budget, t_min, t_max, y_min, y_max, '-');
    draw_curve(&mut grid, &rolling, t_min, t_max, y_min, y_max, '*');

    for r in rows {
        let x = map_x(x_of(r.date()), t_min, t_max, width);
        let y = map_y(r.row.pr, y_min, y_max, height);
        grid[y][x] = 'o';
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: date=[{}, {}] | PR=[{y_min:.2}, {y_max:.2}]%\n",
        first.date(),
        last.date()
    ));

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    out
}

fn y_range(rows: &[EnrichedRow], rolling: &[(f64, f64)]) -> (f64, f64) {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    let values = rows
        .iter()
        .flat_map(|r| [r.row.pr, r.budget])
        .chain(rolling.iter().map(|&(_, y)| y));
    for v in values {
        min_y = min_y.min(v);
        max_y = max_y.max(v);
    }
    widen_if_flat(min_y, max_y)
}

fn widen_if_flat(min: f64, max: f64) -> (f64, f64) {
    if max > min { (min, max) } else { (min - 0.5, max + 0.5) }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(
    grid: &mut [Vec<char>],
    curve: &[(f64, f64)],
    t_min: f64,
    t_max: f64,
    y_min: f64,
    y_max: f64,
    ch: char,
) {
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(t, y) in curve {
        let x = map_x(t, t_min, t_max, width);
        let yy = map_y(y, y_min, y_max, height);
        match prev {
            Some((x0, y0)) => draw_line(grid, x0, y0, x, yy, ch),
            None if grid[yy][x] == ' ' => grid[yy][x] = ch,
            None => {}
        }
        prev = Some((x, yy));
    }
}

/// Integer line drawing (Bresenham-ish). Only fills empty cells.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BudgetParams, ConsolidatedRow};
    use crate::metrics::enrich;

    #[test]
    fn plot_golden_snapshot_small() {
        let rows = vec![
            ConsolidatedRow {
                date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
                ghi: 3.0,
                pr: 70.0,
            },
            ConsolidatedRow {
                date: NaiveDate::from_ymd_opt(2020, 1, 11).unwrap(),
                ghi: 3.0,
                pr: 80.0,
            },
        ];
        let enriched = enrich(&rows, &BudgetParams::default()).unwrap();

        let txt = render_ascii_plot(&enriched, 10, 5);
        let expected = concat!(
            "Plot: date=[2020-01-01, 2020-01-11] | PR=[69.50, 80.50]%\n",
            "         o\n",
            "          \n",
            "----------\n",
            "          \n",
            "o         \n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn single_row_does_not_divide_by_zero() {
        let rows = vec![ConsolidatedRow {
            date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            ghi: 3.0,
            pr: 73.9,
        }];
        let enriched = enrich(&rows, &BudgetParams::default()).unwrap();
        let txt = render_ascii_plot(&enriched, 12, 6);
        assert_eq!(txt.lines().count(), 7);
        let points: usize = txt.lines().skip(1).map(|l| l.matches('o').count()).sum();
        assert_eq!(points, 1);
    }

    #[test]
    fn empty_input() {
        assert_eq!(render_ascii_plot(&[], 10, 5), "Plot: (no rows)\n");
    }
}
