pub mod action;
pub mod config;
pub mod state;

pub use action::Action;
pub use config::{Config, LogConfig, LogLevel, SyncConfig};
pub use state::{Toast, ToastLevel, WatchState};
