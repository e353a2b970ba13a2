use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app::Action;
use crate::ui::helpers::STYLE_KEY;

pub struct StatusBarWidget {
    busy: Option<Action>,
}

impl StatusBarWidget {
    pub fn new(busy: Option<Action>) -> Self {
        Self { busy }
    }

    pub fn render(self, frame: &mut Frame, area: Rect) {
        let line = if let Some(action) = self.busy {
            Line::from(Span::styled(
                format!("{}...", action.progress_label()),
                Style::default().fg(Color::Yellow),
            ))
        } else {
            let mut spans: Vec<Span> = Vec::new();
            for (i, (key, action)) in Action::key_hints().iter().enumerate() {
                if i > 0 {
                    spans.push(Span::raw(" "));
                }
                spans.push(Span::styled(format!("[{}]", key), STYLE_KEY));
                spans.push(Span::styled(
                    action.to_string(),
                    Style::default().fg(Color::White),
                ));
            }
            Line::from(spans)
        };

        frame.render_widget(Paragraph::new(line), area);
    }
}
