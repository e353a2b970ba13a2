use std::path::PathBuf;

use super::action::Action;
use crate::error::SyncError;
use crate::sync::{ControllerState, SyncStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub level: ToastLevel,
    pub created_at: std::time::Instant,
    pub duration_secs: u64,
}

impl Toast {
    pub fn new(message: String, level: ToastLevel) -> Self {
        let duration_secs = match level {
            ToastLevel::Success => 3,
            ToastLevel::Info => 3,
            ToastLevel::Warning => 4,
            ToastLevel::Error => 5,
        };
        Self {
            message,
            level,
            created_at: std::time::Instant::now(),
            duration_secs,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed().as_secs() >= self.duration_secs
    }
}

/// Everything the watch screen renders.
#[derive(Debug)]
pub struct WatchState {
    pub title: String,
    pub path: PathBuf,
    pub sync: ControllerState,
    pub busy: Option<Action>,
    pub toast: Option<Toast>,
    pub should_quit: bool,
}

impl WatchState {
    pub fn new(title: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            title: title.into(),
            path: path.into(),
            sync: ControllerState::default(),
            busy: None,
            toast: None,
            should_quit: false,
        }
    }

    pub fn apply(&mut self, sync: ControllerState) {
        self.sync = sync;
    }

    pub fn show_toast(&mut self, message: impl Into<String>, level: ToastLevel) {
        self.toast = Some(Toast::new(message.into(), level));
    }

    pub fn clear_expired_toast(&mut self) {
        if self.toast.as_ref().is_some_and(Toast::is_expired) {
            self.toast = None;
        }
    }

    /// Returns false when another user action is still running.
    pub fn begin(&mut self, action: Action) -> bool {
        if self.busy.is_some() {
            self.show_toast("Busy, try again in a moment", ToastLevel::Warning);
            return false;
        }
        self.busy = Some(action);
        true
    }

    pub fn finish(&mut self, action: Action, result: Result<(), SyncError>) {
        self.busy = None;
        match result {
            Ok(()) => {
                let message = match (action, self.status()) {
                    (Action::Sync, Some(SyncStatus::Offline)) => "Remote unreachable".to_string(),
                    _ => action.done_label().to_string(),
                };
                self.show_toast(message, ToastLevel::Success);
            }
            Err(SyncError::ConflictsRequireManualResolution) => {
                self.show_toast("Resolve conflicts manually", ToastLevel::Warning);
            }
            Err(e) => {
                self.show_toast(e.to_string(), ToastLevel::Error);
            }
        }
    }

    pub fn status(&self) -> Option<SyncStatus> {
        self.sync.data.as_ref().map(|d| d.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::SyncStatusData;

    #[test]
    fn test_begin_refuses_while_busy() {
        let mut state = WatchState::new("widgets", "/work/widgets");
        assert!(state.begin(Action::Push));
        assert!(!state.begin(Action::Pull));
        assert_eq!(state.busy, Some(Action::Push));
        assert_eq!(state.toast.as_ref().map(|t| t.level), Some(ToastLevel::Warning));
    }

    #[test]
    fn test_finish_reports_outcome() {
        let mut state = WatchState::new("widgets", "/work/widgets");
        state.begin(Action::Push);
        state.finish(
            Action::Push,
            Err(SyncError::ActionFailure {
                action: "push",
                stderr: "rejected".to_string(),
            }),
        );
        assert!(state.busy.is_none());
        let toast = state.toast.as_ref().unwrap();
        assert_eq!(toast.level, ToastLevel::Error);
        assert!(toast.message.contains("rejected"));

        state.begin(Action::Sync);
        state.finish(Action::Sync, Err(SyncError::ConflictsRequireManualResolution));
        assert_eq!(state.toast.as_ref().map(|t| t.level), Some(ToastLevel::Warning));
    }

    #[test]
    fn test_sync_while_offline_says_so() {
        let mut state = WatchState::new("widgets", "/work/widgets");
        state.apply(ControllerState {
            data: Some(SyncStatusData {
                status: SyncStatus::Offline,
                last_synced_at: None,
                pending_changes: 0,
                remote_url: None,
                branch: None,
            }),
            loading: false,
            error: None,
        });
        state.begin(Action::Sync);
        state.finish(Action::Sync, Ok(()));
        assert_eq!(state.toast.unwrap().message, "Remote unreachable");
    }

    #[test]
    fn test_toast_expiry() {
        let mut state = WatchState::new("widgets", "/work/widgets");
        state.toast = Some(Toast {
            message: "old".to_string(),
            level: ToastLevel::Info,
            created_at: std::time::Instant::now(),
            duration_secs: 0,
        });
        state.clear_expired_toast();
        assert!(state.toast.is_none());
    }
}
