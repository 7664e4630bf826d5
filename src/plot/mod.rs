//! Chart rendering.
//!
//! - `chart`: the SVG performance chart (plotters)
//! - `ascii`: a fixed-grid terminal preview

pub mod ascii;
pub mod chart;

pub use ascii::render_ascii_plot;
pub use chart::{ChartOptions, render_svg_chart};
