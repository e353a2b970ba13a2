use chrono::{DateTime, Utc};
use ratatui::style::{Color, Modifier, Style};

use crate::sync::SyncStatus;

pub const STYLE_LABEL: Style = Style::new().fg(Color::White);
pub const STYLE_VALUE: Style = Style::new().fg(Color::Gray);
pub const STYLE_MUTED: Style = Style::new().fg(Color::DarkGray);
pub const STYLE_ERROR: Style = Style::new().fg(Color::Red);
pub const STYLE_KEY: Style = Style::new().fg(Color::Cyan).add_modifier(Modifier::BOLD);

pub fn status_color(status: SyncStatus) -> Color {
    match status {
        SyncStatus::Synced => Color::Green,
        SyncStatus::PendingPush => Color::Yellow,
        SyncStatus::PendingPull => Color::Cyan,
        SyncStatus::Conflict => Color::Red,
        SyncStatus::Offline => Color::DarkGray,
        SyncStatus::LocalOnly => Color::Gray,
    }
}

/// Human-readable age of `then`, relative to `now`.
pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let duration = now.signed_duration_since(then);

    if duration.num_seconds() < 60 {
        format!("{}s ago", duration.num_seconds().max(0))
    } else if duration.num_minutes() < 60 {
        format!("{}m ago", duration.num_minutes())
    } else if duration.num_hours() < 24 {
        format!("{}h ago", duration.num_hours())
    } else {
        format!("{}d ago", duration.num_days())
    }
}
