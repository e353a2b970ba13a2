use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// What the watch loop was asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Refresh,
    Push,
    Pull,
    Sync,
    Fetch,
    Quit,
}

impl Action {
    pub fn from_key(key: KeyEvent) -> Option<Self> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('c') => Some(Action::Quit),
                _ => None,
            };
        }

        match key.code {
            KeyCode::Char('r') => Some(Action::Refresh),
            KeyCode::Char('p') => Some(Action::Push),
            KeyCode::Char('l') => Some(Action::Pull),
            KeyCode::Char('s') => Some(Action::Sync),
            KeyCode::Char('f') => Some(Action::Fetch),
            KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
            _ => None,
        }
    }

    /// Verb shown while the action runs.
    pub fn progress_label(&self) -> &'static str {
        match self {
            Action::Refresh => "Refreshing",
            Action::Push => "Pushing",
            Action::Pull => "Pulling",
            Action::Sync => "Syncing",
            Action::Fetch => "Fetching",
            Action::Quit => "Quitting",
        }
    }

    pub fn done_label(&self) -> &'static str {
        match self {
            Action::Refresh => "Refreshed",
            Action::Push => "Pushed",
            Action::Pull => "Pulled",
            Action::Sync => "Synced",
            Action::Fetch => "Fetched",
            Action::Quit => "Bye",
        }
    }

    /// Key hints for the status bar, in display order.
    pub fn key_hints() -> &'static [(&'static str, &'static str)] {
        &[
            ("r", "refresh"),
            ("p", "push"),
            ("l", "pull"),
            ("s", "sync"),
            ("f", "fetch"),
            ("q", "quit"),
        ]
    }
}
