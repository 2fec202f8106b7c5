//! Plain-text rendering of dashboard sections.

use chrono::{DateTime, Utc};

use crate::dashboard::{Chart, DashboardView};
use crate::model::{ChartSeries, LaggedPoint, LeaderboardEntry, PrizeEntry, Section};
use crate::stream::{Family, HorizonButton, NavTarget};

pub const MAX_LAGGED_ROWS: usize = 50;

pub const NO_LEADERBOARD: &str = "No leaderboard available.";
pub const NO_LAGGED: &str = "No lagged values available.";
pub const NO_PRIZES: &str = "No prizes available.";
pub const NO_CHART: &str = "No chart available.";
pub const NO_STREAMS: &str = "No streams available.";

/// Round half up, as the browser's `Math.round` does.
pub fn round_to(x: f64, digits: i32) -> f64 {
    let p = 10f64.powi(digits);
    (x * p + 0.5).floor() / p
}

/// Points column: three decimals, explicit `+` on non-negative values.
pub fn signed_points(x: f64) -> String {
    let r = round_to(x, 3);
    if x < 0.0 {
        format!("{}", r)
    } else {
        format!("+{}", r)
    }
}

/// `M/D HH:MM:SS` in UTC.
pub fn format_timestamp(unix: i64) -> String {
    match DateTime::<Utc>::from_timestamp(unix, 0) {
        Some(dt) => dt.format("%-m/%-d %H:%M:%S").to_string(),
        None => unix.to_string(),
    }
}

/// Left-aligned columns separated by ` | `, with a rule under the header.
pub fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }
    let line = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:<width$}", c, width = *w))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };
    let mut out = String::new();
    out.push_str(&line(headers.to_vec()));
    out.push('\n');
    out.push_str(&widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("-+-"));
    out.push('\n');
    for row in rows {
        out.push_str(&line(row.iter().map(String::as_str).collect()));
        out.push('\n');
    }
    out
}

fn placeholder(msg: &str) -> String {
    format!("{}\n", msg)
}

pub fn render_leaderboard(section: &Section<Vec<LeaderboardEntry>>) -> String {
    let Some(entries) = section.ready() else {
        return placeholder(NO_LEADERBOARD);
    };
    let rows: Vec<Vec<String>> = entries
        .iter()
        .map(|e| vec![e.rank.to_string(), e.participant_id.clone(), signed_points(e.score)])
        .collect();
    table(&["Rank", "MUID", "Points"], &rows)
}

/// `None` hides the current-value box.
pub fn render_current_value(section: &Section<f64>) -> Option<String> {
    section.ready().map(|v| format!("Current value: {}\n", round_to(*v, 5)))
}

pub fn render_lagged(section: &Section<Vec<LaggedPoint>>, family: Family) -> String {
    let points = match section.ready() {
        Some(p) if !p.is_empty() => p,
        _ => return placeholder(NO_LAGGED),
    };
    let value_header = if family.is_z() { "Z-Score" } else { "Data" };
    let rows: Vec<Vec<String>> = points
        .iter()
        .take(MAX_LAGGED_ROWS)
        .map(|p| vec![format_timestamp(p.timestamp), round_to(p.value, 5).to_string()])
        .collect();
    table(&["Timestamp", value_header], &rows)
}

pub fn render_prizes(section: &Section<Vec<PrizeEntry>>) -> String {
    let Some(entries) = section.ready() else {
        return placeholder(NO_PRIZES);
    };
    let rows: Vec<Vec<String>> = entries
        .iter()
        .map(|e| vec![e.display_sponsor().to_string(), signed_points(e.value)])
        .collect();
    table(&["Sponsor", "Value"], &rows)
}

pub fn render_horizons(buttons: &[HorizonButton]) -> Option<String> {
    if buttons.is_empty() {
        return None;
    }
    let row = buttons
        .iter()
        .map(|b| {
            if b.current {
                format!("[*{} sec*]", b.delay)
            } else {
                format!("[{} sec]", b.delay)
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    Some(format!("Horizons: {}\n", row))
}

pub fn render_nav(targets: &[NavTarget]) -> String {
    targets
        .iter()
        .map(|t| format!("  {} -> {}\n", t.label, t.href()))
        .collect()
}

pub fn render_bar(section: &Section<ChartSeries>, width: usize) -> String {
    let Some(series) = section.ready() else {
        return placeholder(NO_CHART);
    };
    let max = series.y.iter().fold(0.0f64, |m, y| m.max(y.abs()));
    let rows: Vec<Vec<String>> = series
        .x
        .iter()
        .zip(&series.y)
        .map(|(x, y)| {
            let len = if max > 0.0 {
                ((y.abs() / max) * width as f64).round() as usize
            } else {
                0
            };
            vec![round_to(*x, 5).to_string(), "#".repeat(len), round_to(*y, 5).to_string()]
        })
        .collect();
    table(&["x", "", "y"], &rows)
}

/// Cumulative share of `y` over ascending `x`.
pub fn cdf_points(series: &ChartSeries) -> Vec<(f64, f64)> {
    let mut pairs: Vec<(f64, f64)> = series.x.iter().copied().zip(series.y.iter().copied()).collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
    let total: f64 = pairs.iter().map(|(_, y)| y.max(0.0)).sum();
    if total <= 0.0 {
        return Vec::new();
    }
    let mut acc = 0.0;
    pairs
        .into_iter()
        .map(|(x, y)| {
            acc += y.max(0.0);
            (x, acc / total)
        })
        .collect()
}

pub fn render_cdf(section: &Section<ChartSeries>, width: usize) -> String {
    let points = section.ready().map(cdf_points).unwrap_or_default();
    if points.is_empty() {
        return placeholder(NO_CHART);
    }
    let rows: Vec<Vec<String>> = points
        .iter()
        .map(|(x, p)| {
            let len = (p * width as f64).round() as usize;
            vec![round_to(*x, 5).to_string(), "=".repeat(len), round_to(*p, 3).to_string()]
        })
        .collect();
    table(&["x", "", "P(X<=x)"], &rows)
}

pub fn render_streams(section: &Section<Vec<NavTarget>>) -> String {
    match section.ready() {
        Some(targets) if !targets.is_empty() => render_nav(targets),
        _ => placeholder(NO_STREAMS),
    }
}

pub fn render_dashboard(view: &DashboardView, bar_width: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!("== {} ==\n", view.ctx.id.name()));
    if let Some(v) = render_current_value(&view.current_value) {
        out.push_str(&v);
    }
    if let Some(h) = render_horizons(&view.horizons) {
        out.push_str(&h);
    }
    out.push_str("\nNavigation\n");
    out.push_str(&render_nav(&view.nav));
    out.push_str("\nLeaderboard\n");
    out.push_str(&render_leaderboard(&view.leaderboard));
    out.push_str("\nLagged values\n");
    out.push_str(&render_lagged(&view.lagged, view.ctx.id.family));
    match &view.chart {
        Chart::Cdf { series } => {
            out.push_str("\nCDF\n");
            out.push_str(&render_cdf(series, bar_width));
        }
        Chart::Bar { series, refresh } => {
            out.push_str(if *refresh { "\nBar chart (updated)\n" } else { "\nBar chart\n" });
            out.push_str(&render_bar(series, bar_width));
        }
    }
    out
}
