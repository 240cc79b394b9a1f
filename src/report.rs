//! Human-readable bias comparison report

use crate::comparison::ComparisonResult;
use crate::stats::Statistics;
use std::fmt;

const RULE_WIDTH: usize = 70;

/// Text report over a comparison, written through [`fmt::Display`]
#[derive(Debug, Clone, Copy)]
pub struct TextReport<'a>(pub &'a ComparisonResult);

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_text(f, self.0)
    }
}

/// Render the full text report
pub fn render_text(result: &ComparisonResult) -> String {
    TextReport(result).to_string()
}

fn write_text(out: &mut fmt::Formatter<'_>, result: &ComparisonResult) -> fmt::Result {
    let heavy = "=".repeat(RULE_WIDTH);
    let light = "-".repeat(RULE_WIDTH);
    let (t_start, t_end) = result.time_range;

    writeln!(out, "{}", heavy)?;
    writeln!(out, "EKF3 Z-AXIS BIAS ANALYSIS")?;
    writeln!(out, "{}", heavy)?;
    writeln!(
        out,
        "Time range: {:.1}s to {:.1}s ({:.1}s duration)",
        t_start,
        t_end,
        result.duration()
    )?;
    writeln!(
        out,
        "Original samples ({}): {}",
        result.original.label(),
        result.original.len()
    )?;
    writeln!(
        out,
        "Replayed samples ({}): {}",
        result.replayed.label(),
        result.replayed.len()
    )?;
    writeln!(out)?;

    write_stats(out, "Original", &result.original_stats)?;

    if let Some(ref replayed) = result.replayed_stats {
        write_stats(out, "Replayed", replayed)?;
    }

    if let Some(improvement) = result.drift_improvement() {
        writeln!(out, "Improvement: {:.3} m/s² less drift", improvement)?;
        writeln!(out)?;
    }

    writeln!(out, "{}", light)?;
    if result.has_replay {
        writeln!(
            out,
            "{:>8} {:<25} {:>12} {:>12} {:>10}",
            "Time", "Phase", "Original", "Replayed", "Delta"
        )?;
    } else {
        writeln!(out, "{:>8} {:<25} {:>12}", "Time", "Phase", "Z-bias")?;
    }
    writeln!(out, "{}", light)?;

    for row in &result.rows {
        if result.has_replay {
            // Rows without a replayed value stay in the result but are not shown.
            if let (Some(replayed), Some(delta)) = (row.replayed, row.delta) {
                writeln!(
                    out,
                    "{:>7.1}s {:<25} {:>+12.3} {:>+12.3} {:>+10.3}",
                    row.time, row.phase, row.original, replayed, delta
                )?;
            }
        } else {
            writeln!(
                out,
                "{:>7.1}s {:<25} {:>+12.3}",
                row.time, row.phase, row.original
            )?;
        }
    }

    writeln!(out, "{}", light)?;
    Ok(())
}

fn write_stats(out: &mut fmt::Formatter<'_>, name: &str, stats: &Statistics) -> fmt::Result {
    writeln!(out, "{} Z-bias statistics:", name)?;
    writeln!(out, "  Mean:  {:+.3} m/s²", stats.mean)?;
    writeln!(out, "  Std:   {:.3} m/s²", stats.std)?;
    writeln!(out, "  Range: {:+.3} to {:+.3} m/s²", stats.min, stats.max)?;
    writeln!(out, "  Drift: {:.3} m/s²", stats.drift())?;
    writeln!(out)
}
