use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

/// Captured result of one git invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl GitOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Trimmed stdout when the command succeeded with non-empty output.
    pub fn trimmed_stdout(&self) -> Option<String> {
        if !self.success {
            return None;
        }
        let trimmed = self.stdout.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

/// Executes a git argument vector against a working copy.
///
/// Every invocation is scoped to `path` (`git -C <path> ...`); the process
/// working directory is never relied upon.
#[async_trait]
pub trait GitRunner: Send + Sync {
    async fn run(&self, path: &Path, args: &[&str]) -> io::Result<GitOutput>;
}

/// Runs the real `git` binary.
#[derive(Debug, Clone)]
pub struct SystemGit {
    binary: PathBuf,
    timeout: Option<Duration>,
}

impl SystemGit {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl Default for SystemGit {
    fn default() -> Self {
        Self::new("git")
    }
}

#[async_trait]
impl GitRunner for SystemGit {
    async fn run(&self, path: &Path, args: &[&str]) -> io::Result<GitOutput> {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("-C")
            .arg(path)
            .args(args)
            // A credential prompt would block the pass forever.
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(std::process::Stdio::null())
            // Timeouts and aborted passes drop the future; the child must go with it.
            .kill_on_drop(true);

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, cmd.output())
                .await
                .map_err(|_| {
                    io::Error::new(
                        io::ErrorKind::TimedOut,
                        format!("git {} timed out after {:?}", args.join(" "), limit),
                    )
                })??,
            None => cmd.output().await?,
        };

        Ok(GitOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}
