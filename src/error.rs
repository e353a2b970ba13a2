use std::io;
use thiserror::Error;

/// Errors surfaced by the sync engine.
///
/// Failing read queries never show up here; they are absorbed by
/// [`crate::git::GitQueryAdapter`] and mapped to fallback values.
#[derive(Error, Debug)]
pub enum SyncError {
    /// A push/pull (or other mutating git command) exited non-zero.
    /// `stderr` is the process output, verbatim.
    #[error("git {action} failed: {stderr}")]
    ActionFailure { action: &'static str, stderr: String },

    /// The git process could not be started at all.
    #[error("could not run git {action}: {source}")]
    Spawn {
        action: &'static str,
        #[source]
        source: io::Error,
    },

    /// No branch or remote is known for the working copy.
    #[error("{0}")]
    Configuration(String),

    #[error("conflicts must be resolved manually")]
    ConflictsRequireManualResolution,
}

impl SyncError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        SyncError::Configuration(msg.into())
    }

    /// Raw stderr of a failed git action, if that is what this error is.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            SyncError::ActionFailure { stderr, .. } => Some(stderr),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
