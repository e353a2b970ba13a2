pub mod classifier;
pub mod controller;
pub mod hub;
pub mod locks;
pub mod scheduler;
pub mod status;

pub use classifier::{classify, SyncProbe};
pub use controller::{ControllerBuilder, ControllerState, SyncStatusController};
pub use hub::SyncHub;
pub use locks::PathLocks;
pub use scheduler::{FocusEvent, RefreshSubscription, DEFAULT_REFRESH_INTERVAL};
pub use status::{SyncStatus, SyncStatusData};
