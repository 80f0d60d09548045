//! Plain-text daily summary of the audit log.

use std::fmt::Write;

use flow_core::formatting::format_hms;
use flow_data::aggregator::{DailyFocus, FocusAggregator, StateTotals};

const HEADER: [&str; 7] = ["Day", "Focus", "Tracking", "Warn", "Focus %", "Score", "Top app"];

/// Render `days` as a fixed-width table with a totals row.
pub fn render_summary(days: &[DailyFocus]) -> String {
    if days.is_empty() {
        return "No focus data recorded yet.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(out, "{}", row(&HEADER.map(str::to_string)));
    let _ = writeln!(out, "{}", "-".repeat(84));
    for day in days {
        let top = day.top_app().unwrap_or("-");
        let _ = writeln!(out, "{}", row(&cells(&day.day, &day.totals, top)));
    }
    let _ = writeln!(out, "{}", "-".repeat(84));

    let totals = FocusAggregator::calculate_totals(days);
    let _ = writeln!(out, "{}", row(&cells("Total", &totals, "")));
    out
}

fn cells(label: &str, totals: &StateTotals, top_app: &str) -> [String; 7] {
    [
        label.to_string(),
        format_hms(totals.focus_ms / 1_000),
        format_hms(totals.tracking_ms / 1_000),
        format_hms(totals.warn_ms / 1_000),
        format!("{:.1}%", totals.focus_percentage()),
        format!("{:.1}", totals.mean_score()),
        top_app.to_string(),
    ]
}

fn row(c: &[String; 7]) -> String {
    format!(
        "{:<12}{:>10}{:>10}{:>10}{:>9}{:>8}  {}",
        c[0], c[1], c[2], c[3], c[4], c[5], c[6]
    )
    .trim_end()
    .to_string()
}
