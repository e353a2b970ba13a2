mod status_bar;
mod sync_panel;
mod toast;

pub use status_bar::StatusBarWidget;
pub use sync_panel::SyncPanelWidget;
pub use toast::ToastWidget;
