//! End-of-run text report: a coarse ASCII chart of the response-time
//! sequence plus the summary numbers. Output is deterministic for a given
//! [`RunResult`] and geometry, so captured reports diff cleanly.

use priceprobe_core::{RunResult, CHART_HEIGHT, CHART_WIDTH};
use std::fmt::Write;
use std::time::Duration;

/// Render with the default chart geometry.
pub fn render_default(result: &RunResult) -> String {
    render(result, CHART_WIDTH, CHART_HEIGHT)
}

/// Render the fixed-section report at the given chart geometry.
pub fn render(result: &RunResult, width: usize, height: usize) -> String {
    let durations_ms: Vec<f64> = result
        .outcomes
        .iter()
        .map(|o| o.duration.as_secs_f64() * 1e3)
        .collect();

    let mut out = String::new();
    let _ = writeln!(out, "Performance Test Results");
    let _ = writeln!(out, "========================");
    let _ = writeln!(out);

    let _ = writeln!(out, "Response Time Distribution");
    let _ = writeln!(out, "--------------------------");
    if durations_ms.is_empty() {
        let _ = writeln!(out, "(no samples)");
    } else {
        let _ = writeln!(out, "{}", ascii_chart(&durations_ms, width, height));
    }
    let _ = writeln!(out, "Min: {}", fmt_ms(result.duration_min));
    let _ = writeln!(out, "Max: {}", fmt_ms(result.duration_max));
    let _ = writeln!(out, "Avg: {}", fmt_ms(result.duration_avg));
    let _ = writeln!(out);

    let _ = writeln!(out, "Summary");
    let _ = writeln!(out, "-------");
    let _ = writeln!(out, "Total Iterations: {}", result.total);
    let _ = writeln!(out, "Wall Clock: {}", fmt_wall_clock(result.wall_clock));
    let _ = writeln!(out, "Success Rate: {}", fmt_rate(result.success_rate));
    let _ = writeln!(out, "Error Rate: {}", fmt_rate(result.error_rate));
    let _ = writeln!(out, "P90 Response Time: {}", fmt_ms(result.duration_p90));
    let _ = writeln!(out, "P95 Response Time: {}", fmt_ms(result.duration_p95));
    let _ = writeln!(out);

    let _ = writeln!(out, "Rate Limit Stats");
    let _ = writeln!(out, "----------------");
    let _ = writeln!(
        out,
        "Min Remaining: {}",
        result
            .rate_limit_min
            .map_or_else(|| "n/a".to_string(), |v| v.to_string())
    );
    let _ = writeln!(
        out,
        "Avg Remaining: {}",
        result
            .rate_limit_avg
            .map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"))
    );

    out
}

/// Bucketed normalization of the sample sequence onto a `width` x `height`
/// character grid; one '█' per column at the normalized height.
fn ascii_chart(data: &[f64], width: usize, height: usize) -> String {
    if data.is_empty() || width == 0 || height == 0 {
        return String::new();
    }

    let min = data.iter().copied().fold(f64::INFINITY, f64::min);
    let max = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    let mut rows = vec![vec![' '; width]; height];
    for (i, value) in data.iter().enumerate() {
        let x = (i * width / data.len()).min(width - 1);
        // Zero range (every sample equal) collapses onto the bottom row.
        let y = if range > 0.0 {
            (((value - min) * (height - 1) as f64) / range) as usize
        } else {
            0
        };
        rows[height - 1 - y.min(height - 1)][x] = '█';
    }

    let lines: Vec<String> = rows.into_iter().map(|row| row.into_iter().collect()).collect();
    lines.join("\n")
}

fn fmt_ms(duration: Duration) -> String {
    format!("{:.2}ms", duration.as_secs_f64() * 1e3)
}

fn fmt_rate(rate: f64) -> String {
    if rate.is_nan() {
        "n/a".to_string()
    } else {
        format!("{:.2}%", rate * 100.0)
    }
}

fn fmt_wall_clock(wall_clock: Duration) -> String {
    // Sub-second noise would make otherwise-identical runs diff; seconds are
    // plenty for a report.
    humantime::format_duration(Duration::from_secs(wall_clock.as_secs())).to_string()
}
