//! Formatting helpers shared by the dashboard views.

use chrono::{DateTime, Utc};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use std::time::Duration;

/// Points rendered as a whole number with thousands separators.
pub fn format_points(points: f64) -> String {
    if !points.is_finite() {
        return "0".to_string();
    }
    let rounded = points.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Point change with an explicit sign, e.g. `+50 pts`.
pub fn format_signed_points(points: i64) -> String {
    let magnitude = format_points(points.unsigned_abs() as f64);
    if points < 0 {
        format!("-{magnitude} pts")
    } else {
        format!("+{magnitude} pts")
    }
}

/// English ordinal for a rank: `1st`, `2nd`, `3rd`, `11th`, `22nd`.
pub fn rank_badge(rank: u32) -> String {
    let suffix = match (rank % 10, rank % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{rank}{suffix}")
}

pub fn pluralize(count: usize, singular: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {singular}s")
    }
}

/// Terminal glyph for an achievement icon tag.
pub fn icon_glyph(icon: &str) -> &'static str {
    match icon {
        "rocket" => "🚀",
        "compass" => "🧭",
        "terminal" => "💻",
        "shield" => "🛡",
        "leaf" => "🌿",
        "users" => "👥",
        _ => "🏅",
    }
}

pub fn format_date(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d").to_string()
}

/// Compact age for the header, e.g. `4s ago`, `3m ago`.
pub fn format_age(age: Duration) -> String {
    let secs = age.as_secs();
    match secs {
        0..=59 => format!("{secs}s ago"),
        60..=3599 => format!("{}m ago", secs / 60),
        _ => format!("{}h ago", secs / 3600),
    }
}

/// Percentage split of `area` into a left and right column.
pub fn two_columns(area: Rect, left_percent: u16) -> (Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(left_percent),
            Constraint::Percentage(100 - left_percent.min(100)),
        ])
        .split(area);
    (chunks[0], chunks[1])
}

/// A rectangle of `width` x `height` centered in `area`, clamped to it.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
