pub mod app;
pub mod error;
pub mod git;
pub mod sync;
pub mod ui;
pub mod workspace;

pub use error::{Result, SyncError};
pub use git::{ActionExecutor, GitQueryAdapter, GitRunner, SystemGit};
pub use sync::{
    classify, FocusEvent, RefreshSubscription, SyncHub, SyncStatus, SyncStatusController,
    SyncStatusData,
};
pub use workspace::{resolve_working_copy, ConfiguredProjects, ProjectDirectory};
