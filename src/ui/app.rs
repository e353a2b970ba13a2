use ratatui::{
    layout::{Constraint, Direction, Layout},
    Frame,
};

use crate::app::WatchState;

use super::components::{StatusBarWidget, SyncPanelWidget, ToastWidget};

pub struct WatchWidget<'a> {
    state: &'a WatchState,
}

impl<'a> WatchWidget<'a> {
    pub fn new(state: &'a WatchState) -> Self {
        Self { state }
    }

    pub fn render(self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(1)])
            .split(frame.area());

        SyncPanelWidget::new(&self.state.title, &self.state.sync).render(frame, chunks[0]);
        StatusBarWidget::new(self.state.busy).render(frame, chunks[1]);

        if let Some(toast) = &self.state.toast {
            ToastWidget::new(toast).render(frame);
        }
    }
}
