use std::path::Path;
use std::sync::Arc;

use super::query::DEFAULT_REMOTE;
use super::runner::{GitOutput, GitRunner};
use crate::error::{Result, SyncError};

/// Mutating git operations. Failures carry the raw stderr and are never
/// retried.
#[derive(Clone)]
pub struct ActionExecutor {
    runner: Arc<dyn GitRunner>,
    remote: String,
}

impl ActionExecutor {
    pub fn new(runner: Arc<dyn GitRunner>) -> Self {
        Self::with_remote(runner, DEFAULT_REMOTE)
    }

    pub fn with_remote(runner: Arc<dyn GitRunner>, remote: impl Into<String>) -> Self {
        Self {
            runner,
            remote: remote.into(),
        }
    }

    async fn spawn(&self, action: &'static str, path: &Path, args: &[&str]) -> Result<GitOutput> {
        tracing::info!("git {} in {}", args.join(" "), path.display());

        self.runner
            .run(path, args)
            .await
            .map_err(|source| SyncError::Spawn { action, source })
    }

    async fn execute(&self, action: &'static str, path: &Path, args: &[&str]) -> Result<GitOutput> {
        let output = self.spawn(action, path, args).await?;

        if !output.success {
            tracing::warn!("git {} failed: {}", action, output.stderr.trim());
            return Err(SyncError::ActionFailure {
                action,
                stderr: output.stderr,
            });
        }

        Ok(output)
    }

    /// Push `branch` to the remote. `set_upstream` adds `-u` for a branch the
    /// remote has never seen.
    pub async fn push(&self, path: &Path, branch: &str, set_upstream: bool) -> Result<()> {
        let mut args = vec!["push"];
        if set_upstream {
            args.push("-u");
        }
        args.push(self.remote.as_str());
        args.push(branch);
        self.execute("push", path, &args).await.map(|_| ())
    }

    pub async fn pull(&self, path: &Path, branch: &str) -> Result<()> {
        self.execute("pull", path, &["pull", self.remote.as_str(), branch])
            .await
            .map(|_| ())
    }

    pub async fn fetch(&self, path: &Path) -> Result<()> {
        self.execute("fetch", path, &["fetch", self.remote.as_str()])
            .await
            .map(|_| ())
    }

    /// Stage everything and commit. An empty commit is not an error.
    pub async fn commit_all(&self, path: &Path, message: &str) -> Result<()> {
        self.execute("add", path, &["add", "-A"]).await?;

        let output = self.spawn("commit", path, &["commit", "-m", message]).await?;
        if output.success {
            return Ok(());
        }
        // git reports an empty commit on stdout.
        if is_nothing_to_commit(&output.stdout) || is_nothing_to_commit(&output.stderr) {
            tracing::debug!("nothing to commit in {}", path.display());
            return Ok(());
        }

        tracing::warn!("git commit failed: {}", output.stderr.trim());
        Err(SyncError::ActionFailure {
            action: "commit",
            stderr: output.stderr,
        })
    }
}

fn is_nothing_to_commit(text: &str) -> bool {
    text.contains("nothing to commit")
}
