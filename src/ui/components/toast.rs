use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::{Toast, ToastLevel};

pub struct ToastWidget<'a> {
    toast: &'a Toast,
}

impl<'a> ToastWidget<'a> {
    pub fn new(toast: &'a Toast) -> Self {
        Self { toast }
    }

    pub fn render(self, frame: &mut Frame) {
        let area = toast_area(frame.area(), self.toast.message.chars().count());
        frame.render_widget(Clear, area);

        let (color, icon) = match self.toast.level {
            ToastLevel::Success => (Color::Green, "✓"),
            ToastLevel::Info => (Color::Cyan, "ℹ"),
            ToastLevel::Warning => (Color::Yellow, "⚠"),
            ToastLevel::Error => (Color::Red, "✗"),
        };

        let paragraph = Paragraph::new(Line::from(vec![
            Span::styled(
                format!(" {} ", icon),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
            Span::styled(self.toast.message.as_str(), Style::default().fg(color)),
        ]))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color)),
        );

        frame.render_widget(paragraph, area);
    }
}

fn toast_area(frame_area: Rect, message_len: usize) -> Rect {
    let max_width = frame_area.width.saturating_sub(4);
    let desired_width = (message_len as u16).saturating_add(6).min(max_width);
    let width = desired_width.max(20.min(max_width));

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(3),
            Constraint::Length(2),
        ])
        .split(frame_area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(width),
            Constraint::Min(0),
        ])
        .split(rows[1])[1]
}
