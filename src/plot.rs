//! SVG plot of the bias series
//!
//! One panel per source. With a replay present both panels share the x axis
//! and y limits so drift can be compared by eye.

use crate::comparison::ComparisonResult;
use crate::partition::SourceSeries;
use anyhow::Result;
use plotters::prelude::*;
use std::ops::Range;
use std::path::Path;

const SIZE: (u32, u32) = (1200, 800);
const Y_PADDING: f64 = 0.1;

const ORIGINAL_COLOR: RGBColor = RGBColor(30, 90, 200);
const REPLAYED_COLOR: RGBColor = RGBColor(34, 139, 34);

/// Render the comparison to an SVG file
pub fn render_svg(result: &ComparisonResult, path: &Path) -> Result<()> {
    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let x_range = padded(time_bounds(result), 1.0);
    let y_range = padded(value_bounds(result), Y_PADDING);

    if result.has_replay {
        let panels = root.split_evenly((2, 1));
        draw_panel(
            &panels[0],
            &result.original,
            "Original",
            "Original EKF3 Z-Axis Accel Bias",
            ORIGINAL_COLOR,
            x_range.clone(),
            y_range.clone(),
        )?;
        draw_panel(
            &panels[1],
            &result.replayed,
            "Replayed",
            "Replayed EKF3 Z-Axis Accel Bias (with fixes)",
            REPLAYED_COLOR,
            x_range,
            y_range,
        )?;
    } else {
        draw_panel(
            &root,
            &result.original,
            "Original",
            "Original EKF3 Z-Axis Accel Bias",
            ORIGINAL_COLOR,
            x_range,
            y_range,
        )?;
    }

    root.present()?;
    Ok(())
}

fn draw_panel(
    area: &DrawingArea<SVGBackend<'_>, plotters::coord::Shift>,
    series: &SourceSeries,
    name: &str,
    title: &str,
    color: RGBColor,
    x_range: Range<f64>,
    y_range: Range<f64>,
) -> Result<()> {
    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 20).into_font())
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, y_range)?;

    chart
        .configure_mesh()
        .x_desc("Time (s)")
        .y_desc("Z-bias (m/s²)")
        .draw()?;

    let label = format!("{} ({})", name, series.label());

    chart
        .draw_series(LineSeries::new(series.points(), &color))?
        .label(label)
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    Ok(())
}

fn time_bounds(result: &ComparisonResult) -> (f64, f64) {
    let (mut lo, mut hi) = result.time_range;
    if let Some((r_lo, r_hi)) = result.replayed.time_range() {
        lo = lo.min(r_lo);
        hi = hi.max(r_hi);
    }
    (lo, hi)
}

fn value_bounds(result: &ComparisonResult) -> (f64, f64) {
    let mut lo = result.original_stats.min;
    let mut hi = result.original_stats.max;
    if let Some(replayed) = result.replayed_stats {
        lo = lo.min(replayed.min);
        hi = hi.max(replayed.max);
    }
    (lo, hi)
}

fn padded((lo, hi): (f64, f64), pad: f64) -> Range<f64> {
    (lo - pad)..(hi + pad)
}
