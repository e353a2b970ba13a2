pub mod app;
pub mod components;
pub mod helpers;

pub use app::WatchWidget;
pub use helpers::{status_color, time_ago};
