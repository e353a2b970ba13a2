use chrono::Utc;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::git::remote_label;
use crate::sync::ControllerState;
use crate::ui::helpers::{status_color, time_ago, STYLE_ERROR, STYLE_LABEL, STYLE_MUTED, STYLE_VALUE};

/// The sync status of one working copy: status, branch, remote, pending
/// changes, last commit time, plus the loading flag and any latched error.
pub struct SyncPanelWidget<'a> {
    title: &'a str,
    state: &'a ControllerState,
}

impl<'a> SyncPanelWidget<'a> {
    pub fn new(title: &'a str, state: &'a ControllerState) -> Self {
        Self { title, state }
    }

    fn lines(&self) -> Vec<Line<'static>> {
        let mut lines = Vec::new();

        match &self.state.data {
            None => {
                let text = if self.state.loading {
                    "Checking..."
                } else {
                    "No status yet"
                };
                lines.push(Line::from(Span::styled(text, STYLE_MUTED)));
            }
            Some(data) => {
                let color = status_color(data.status);
                let mut status = vec![Span::styled(
                    format!("{} {}", data.status.symbol(), data.status.label()),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                )];
                if self.state.loading {
                    status.push(Span::styled("  refreshing...", STYLE_MUTED));
                }
                lines.push(Line::from(status));
                lines.push(Line::from(""));

                lines.push(field(
                    "Branch",
                    data.branch.clone().unwrap_or_else(|| "-".to_string()),
                ));
                lines.push(field(
                    "Remote",
                    data.remote_url
                        .as_deref()
                        .map(remote_label)
                        .unwrap_or_else(|| "none".to_string()),
                ));
                lines.push(field("Pending", data.pending_changes.to_string()));
                lines.push(field(
                    "Last commit",
                    data.last_synced_at
                        .map(|t| time_ago(t, Utc::now()))
                        .unwrap_or_else(|| "-".to_string()),
                ));
            }
        }

        if let Some(error) = &self.state.error {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                format!("✗ {}", error),
                STYLE_ERROR.add_modifier(Modifier::BOLD),
            )));
        }

        lines
    }

    pub fn render(self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(format!(" {} ", self.title))
            .borders(Borders::ALL)
            .border_style(STYLE_MUTED);

        let paragraph = Paragraph::new(self.lines())
            .block(block)
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
    }
}

fn field(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{:<12}", label), STYLE_LABEL),
        Span::styled(value, STYLE_VALUE),
    ])
}
