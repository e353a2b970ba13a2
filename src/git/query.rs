use chrono::{DateTime, TimeZone, Utc};
use std::path::Path;
use std::sync::Arc;

use super::runner::{GitOutput, GitRunner};
use super::status::WorkingTreeStatus;

pub const DEFAULT_REMOTE: &str = "origin";

/// Read-only git queries against a working copy.
///
/// None of these fail: a spawn error, a non-zero exit or unparseable output
/// all degrade to the documented fallback for that query.
#[derive(Clone)]
pub struct GitQueryAdapter {
    runner: Arc<dyn GitRunner>,
    remote: String,
}

impl GitQueryAdapter {
    pub fn new(runner: Arc<dyn GitRunner>) -> Self {
        Self::with_remote(runner, DEFAULT_REMOTE)
    }

    pub fn with_remote(runner: Arc<dyn GitRunner>, remote: impl Into<String>) -> Self {
        Self {
            runner,
            remote: remote.into(),
        }
    }

    pub fn remote(&self) -> &str {
        &self.remote
    }

    async fn query(&self, path: &Path, args: &[&str]) -> Option<GitOutput> {
        match self.runner.run(path, args).await {
            Ok(output) if output.success => Some(output),
            Ok(output) => {
                tracing::debug!(
                    "git {} in {} exited non-zero: {}",
                    args.join(" "),
                    path.display(),
                    output.stderr.trim()
                );
                None
            }
            Err(e) => {
                tracing::debug!(
                    "git {} in {} could not run: {}",
                    args.join(" "),
                    path.display(),
                    e
                );
                None
            }
        }
    }

    pub async fn is_repository(&self, path: &Path) -> bool {
        self.query(path, &["rev-parse", "--git-dir"]).await.is_some()
    }

    /// URL of the configured remote; `None` when no such remote exists.
    pub async fn remote_url(&self, path: &Path) -> Option<String> {
        self.query(path, &["remote", "get-url", self.remote.as_str()])
            .await
            .and_then(|o| o.trimmed_stdout())
    }

    /// Current branch; `None` for a detached HEAD or an unborn/unreadable one.
    pub async fn current_branch(&self, path: &Path) -> Option<String> {
        self.query(path, &["rev-parse", "--abbrev-ref", "HEAD"])
            .await
            .and_then(|o| o.trimmed_stdout())
            .filter(|branch| branch != "HEAD")
    }

    pub async fn count_uncommitted_changes(&self, path: &Path) -> u32 {
        self.query(path, &["status", "--porcelain"])
            .await
            .map(|o| count_non_empty_lines(&o.stdout))
            .unwrap_or(0)
    }

    pub async fn working_tree_status(&self, path: &Path) -> WorkingTreeStatus {
        self.query(path, &["status", "--porcelain"])
            .await
            .map(|o| WorkingTreeStatus::parse_porcelain(&o.stdout))
            .unwrap_or_default()
    }

    pub async fn has_conflict_markers(&self, path: &Path) -> bool {
        self.query(path, &["diff", "--name-only", "--diff-filter=U"])
            .await
            .map(|o| !o.stdout.trim().is_empty())
            .unwrap_or(false)
    }

    /// Refreshes remote-tracking refs. This is the only query with a side
    /// effect, and its failure is the only reachability signal.
    pub async fn fetch_remote(&self, path: &Path) -> bool {
        let ok = self.query(path, &["fetch", self.remote.as_str()]).await.is_some();
        if !ok {
            tracing::info!("fetch {} failed in {}", self.remote, path.display());
        }
        ok
    }

    pub async fn ahead_count(&self, path: &Path, branch: &str) -> u32 {
        let range = format!("{}/{}..HEAD", self.remote, branch);
        self.count_revs(path, &range).await
    }

    pub async fn behind_count(&self, path: &Path, branch: &str) -> u32 {
        let range = format!("HEAD..{}/{}", self.remote, branch);
        self.count_revs(path, &range).await
    }

    async fn count_revs(&self, path: &Path, range: &str) -> u32 {
        self.query(path, &["rev-list", range, "--count"])
            .await
            .and_then(|o| o.stdout.trim().parse::<u32>().ok())
            .unwrap_or(0)
    }

    pub async fn last_commit_timestamp(&self, path: &Path) -> Option<DateTime<Utc>> {
        self.query(path, &["log", "-1", "--format=%ct"])
            .await
            .and_then(|o| o.stdout.trim().parse::<i64>().ok())
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
    }

    /// Whether `<remote>/<branch>` exists locally, i.e. the branch has been
    /// pushed (or fetched) before.
    pub async fn has_remote_branch(&self, path: &Path, branch: &str) -> bool {
        let reference = format!("refs/remotes/{}/{}", self.remote, branch);
        self.query(path, &["rev-parse", "--verify", "--quiet", reference.as_str()])
            .await
            .is_some()
    }
}

fn count_non_empty_lines(text: &str) -> u32 {
    text.lines().filter(|l| !l.trim().is_empty()).count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::runner::fake::FakeGit;
    use crate::git::runner::SystemGit;
    use crate::git::testing::{git_in, init_repo};
    use std::io;
    use std::path::PathBuf;

    fn adapter(git: FakeGit) -> GitQueryAdapter {
        GitQueryAdapter::new(Arc::new(git))
    }

    fn repo() -> PathBuf {
        PathBuf::from("/work/widgets")
    }

    #[tokio::test]
    async fn test_fallbacks_on_non_zero_exit() {
        let git = FakeGit::new();
        git.respond("rev-parse --git-dir", GitOutput::failed("not a git repository"))
            .respond("remote get-url origin", GitOutput::failed("No such remote"))
            .respond("rev-parse --abbrev-ref HEAD", GitOutput::failed("bad"))
            .respond("status --porcelain", GitOutput::failed("bad"))
            .respond("diff --name-only --diff-filter=U", GitOutput::failed("bad"))
            .respond("fetch origin", GitOutput::failed("Could not resolve host"))
            .respond("log -1 --format=%ct", GitOutput::failed("bad"));
        let q = adapter(git);

        assert!(!q.is_repository(&repo()).await);
        assert_eq!(q.remote_url(&repo()).await, None);
        assert_eq!(q.current_branch(&repo()).await, None);
        assert_eq!(q.count_uncommitted_changes(&repo()).await, 0);
        assert!(!q.has_conflict_markers(&repo()).await);
        assert!(!q.fetch_remote(&repo()).await);
        assert_eq!(q.ahead_count(&repo(), "main").await, 0);
        assert_eq!(q.behind_count(&repo(), "main").await, 0);
        assert_eq!(q.last_commit_timestamp(&repo()).await, None);
    }

    #[tokio::test]
    async fn test_fallbacks_on_spawn_error() {
        let git = FakeGit::new();
        git.respond_err("rev-parse --git-dir", io::ErrorKind::NotFound)
            .respond_err("status --porcelain", io::ErrorKind::NotFound);
        let q = adapter(git);

        assert!(!q.is_repository(&repo()).await);
        assert_eq!(q.count_uncommitted_changes(&repo()).await, 0);
    }

    #[tokio::test]
    async fn test_counts_and_parses() {
        let git = FakeGit::new();
        git.respond("status --porcelain", GitOutput::ok(" M a.rs\n?? b.rs\n\nA  c.rs\n"))
            .respond("rev-list origin/main..HEAD --count", GitOutput::ok("2\n"))
            .respond("rev-list HEAD..origin/main --count", GitOutput::ok("garbage"))
            .respond("diff --name-only --diff-filter=U", GitOutput::ok("src/lib.rs\n"))
            .respond("log -1 --format=%ct", GitOutput::ok("1700000000\n"));
        let q = adapter(git);

        assert_eq!(q.count_uncommitted_changes(&repo()).await, 3);
        assert_eq!(q.ahead_count(&repo(), "main").await, 2);
        assert_eq!(q.behind_count(&repo(), "main").await, 0);
        assert!(q.has_conflict_markers(&repo()).await);
        assert_eq!(
            q.last_commit_timestamp(&repo()).await.map(|t| t.timestamp()),
            Some(1_700_000_000)
        );
    }

    #[tokio::test]
    async fn test_detached_head_has_no_branch() {
        let git = FakeGit::new();
        git.respond("rev-parse --abbrev-ref HEAD", GitOutput::ok("HEAD\n"));
        assert_eq!(adapter(git).current_branch(&repo()).await, None);
    }

    #[tokio::test]
    async fn test_custom_remote_name_is_used() {
        let git = Arc::new(FakeGit::new());
        git.respond("remote get-url upstream", GitOutput::ok("https://example.com/r.git\n"));
        let q = GitQueryAdapter::with_remote(git.clone(), "upstream");

        assert_eq!(
            q.remote_url(&repo()).await.as_deref(),
            Some("https://example.com/r.git")
        );
        q.ahead_count(&repo(), "dev").await;
        assert!(git
            .calls()
            .contains(&"rev-list upstream/dev..HEAD --count".to_string()));
    }

    #[tokio::test]
    async fn test_real_repository_queries() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());
        std::fs::write(dir.path().join("a.txt"), "one").unwrap();
        git_in(dir.path(), &["add", "a.txt"]);
        git_in(dir.path(), &["commit", "-q", "-m", "initial"]);
        std::fs::write(dir.path().join("a.txt"), "two").unwrap();
        std::fs::write(dir.path().join("b.txt"), "new").unwrap();

        let q = GitQueryAdapter::new(Arc::new(SystemGit::default()));
        assert!(q.is_repository(dir.path()).await);
        assert_eq!(q.current_branch(dir.path()).await.as_deref(), Some("main"));
        assert_eq!(q.remote_url(dir.path()).await, None);
        assert_eq!(q.count_uncommitted_changes(dir.path()).await, 2);
        assert!(q.last_commit_timestamp(dir.path()).await.is_some());
        assert!(!q.has_remote_branch(dir.path(), "main").await);

        let status = q.working_tree_status(dir.path()).await;
        assert_eq!(status.unstaged, vec!["a.txt".to_string()]);
        assert_eq!(status.untracked, vec!["b.txt".to_string()]);
    }
}
