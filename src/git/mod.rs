pub mod action;
pub mod query;
pub mod remote;
pub mod runner;
pub mod status;

pub use action::ActionExecutor;
pub use query::{GitQueryAdapter, DEFAULT_REMOTE};
pub use remote::{parse_remote_url, remote_label, RemoteLocation};
pub use runner::{GitOutput, GitRunner, SystemGit};
pub use status::WorkingTreeStatus;
