//! Maps the raw query results for a working copy onto exactly one
//! [`SyncStatus`].
//!
//! The rules are checked in a fixed order and the first match wins:
//!
//! 1. not a repository → `local_only` (nothing else reported)
//! 2. no remote → `local_only`
//! 3. fetch failed → `offline`
//! 4. unmerged paths → `conflict`
//! 5. no branch (detached HEAD) → `local_only`
//! 6. ahead and behind → `conflict` (diverged, no fast-forward possible)
//! 7. ahead or dirty → `pending_push`
//! 8. behind → `pending_pull`
//! 9. otherwise → `synced`

use chrono::{DateTime, Utc};
use std::path::Path;

use super::status::{SyncStatus, SyncStatusData};
use crate::git::GitQueryAdapter;

/// Inputs to [`classify`], already sanitized by the query adapter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncProbe {
    pub is_repository: bool,
    pub remote_url: Option<String>,
    pub fetch_succeeded: bool,
    pub branch: Option<String>,
    pub has_conflicts: bool,
    pub ahead: u32,
    pub behind: u32,
    pub pending_changes: u32,
    pub last_commit_at: Option<DateTime<Utc>>,
}

impl SyncProbe {
    /// Run the queries for `path` one after another, in rule order.
    ///
    /// Queries whose answer cannot change the outcome are skipped: nothing
    /// past `is_repository` runs for a non-repository, there is no fetch
    /// without a remote, and ahead/behind are only counted once the fetch
    /// succeeded, no conflict markers were found and a branch is known.
    pub async fn gather(git: &GitQueryAdapter, path: &Path) -> Self {
        let mut probe = SyncProbe::default();

        probe.is_repository = git.is_repository(path).await;
        if !probe.is_repository {
            return probe;
        }

        probe.pending_changes = git.count_uncommitted_changes(path).await;
        probe.branch = git.current_branch(path).await;
        probe.remote_url = git.remote_url(path).await;
        if probe.remote_url.is_none() {
            return probe;
        }

        probe.last_commit_at = git.last_commit_timestamp(path).await;
        probe.fetch_succeeded = git.fetch_remote(path).await;
        if !probe.fetch_succeeded {
            return probe;
        }

        probe.has_conflicts = git.has_conflict_markers(path).await;
        if probe.has_conflicts {
            return probe;
        }

        if let Some(branch) = probe.branch.as_deref() {
            probe.ahead = git.ahead_count(path, branch).await;
            probe.behind = git.behind_count(path, branch).await;
        }

        probe
    }
}

/// Classify a probe. Total and side-effect free.
pub fn classify(probe: &SyncProbe) -> SyncStatusData {
    if !probe.is_repository {
        return SyncStatusData::not_a_repository();
    }

    let Some(remote_url) = probe.remote_url.clone() else {
        return SyncStatusData {
            status: SyncStatus::LocalOnly,
            last_synced_at: None,
            pending_changes: probe.pending_changes,
            remote_url: None,
            branch: probe.branch.clone(),
        };
    };

    let status = if !probe.fetch_succeeded {
        SyncStatus::Offline
    } else if probe.has_conflicts {
        SyncStatus::Conflict
    } else if probe.branch.is_none() {
        SyncStatus::LocalOnly
    } else if probe.ahead > 0 && probe.behind > 0 {
        SyncStatus::Conflict
    } else if probe.ahead > 0 || probe.pending_changes > 0 {
        SyncStatus::PendingPush
    } else if probe.behind > 0 {
        SyncStatus::PendingPull
    } else {
        SyncStatus::Synced
    };

    SyncStatusData {
        status,
        last_synced_at: probe.last_commit_at,
        pending_changes: probe.pending_changes,
        remote_url: Some(remote_url),
        branch: probe.branch.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::runner::fake::FakeGit;
    use crate::git::GitOutput;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn connected() -> SyncProbe {
        SyncProbe {
            is_repository: true,
            remote_url: Some("git@github.com:acme/widgets.git".to_string()),
            fetch_succeeded: true,
            branch: Some("main".to_string()),
            has_conflicts: false,
            ahead: 0,
            behind: 0,
            pending_changes: 0,
            last_commit_at: DateTime::from_timestamp(1_700_000_000, 0),
        }
    }

    fn status_of(probe: SyncProbe) -> SyncStatus {
        classify(&probe).status
    }

    #[test]
    fn test_not_a_repository_wins_over_everything() {
        let probe = SyncProbe {
            is_repository: false,
            ahead: 5,
            has_conflicts: true,
            ..connected()
        };
        let data = classify(&probe);
        assert_eq!(data, SyncStatusData::not_a_repository());
    }

    #[test]
    fn test_no_remote_is_local_only_with_pending_changes() {
        let probe = SyncProbe {
            remote_url: None,
            pending_changes: 4,
            ..connected()
        };
        let data = classify(&probe);
        assert_eq!(data.status, SyncStatus::LocalOnly);
        assert_eq!(data.pending_changes, 4);
        assert_eq!(data.remote_url, None);
        assert_eq!(data.last_synced_at, None);
    }

    #[test]
    fn test_fetch_failure_is_offline() {
        let data = classify(&SyncProbe {
            fetch_succeeded: false,
            pending_changes: 2,
            ..connected()
        });
        assert_eq!(data.status, SyncStatus::Offline);
        assert_eq!(data.pending_changes, 2);
        assert!(data.remote_url.is_some());
        assert_eq!(data.branch.as_deref(), Some("main"));
        assert!(data.last_synced_at.is_some());

        assert_eq!(
            status_of(SyncProbe {
                fetch_succeeded: false,
                has_conflicts: true,
                ..connected()
            }),
            SyncStatus::Offline
        );
    }

    #[test]
    fn test_conflict_markers() {
        assert_eq!(
            status_of(SyncProbe {
                has_conflicts: true,
                ..connected()
            }),
            SyncStatus::Conflict
        );
    }

    #[test]
    fn test_detached_head_is_local_only() {
        let data = classify(&SyncProbe {
            branch: None,
            ahead: 3,
            ..connected()
        });
        assert_eq!(data.status, SyncStatus::LocalOnly);
        assert!(data.remote_url.is_some());
    }

    #[test]
    fn test_ahead_behind_rules() {
        assert_eq!(
            status_of(SyncProbe {
                ahead: 2,
                ..connected()
            }),
            SyncStatus::PendingPush
        );
        assert_eq!(
            status_of(SyncProbe {
                behind: 3,
                ..connected()
            }),
            SyncStatus::PendingPull
        );
        for has_conflicts in [false, true] {
            assert_eq!(
                status_of(SyncProbe {
                    ahead: 1,
                    behind: 1,
                    has_conflicts,
                    ..connected()
                }),
                SyncStatus::Conflict
            );
        }
    }

    #[test]
    fn test_dirty_tree_outranks_behind() {
        assert_eq!(
            status_of(SyncProbe {
                pending_changes: 1,
                behind: 2,
                ..connected()
            }),
            SyncStatus::PendingPush
        );
    }

    #[test]
    fn test_end_to_end_shapes() {
        let data = classify(&connected());
        assert_eq!(data.status, SyncStatus::Synced);
        assert_eq!(data.pending_changes, 0);

        let data = classify(&SyncProbe {
            pending_changes: 3,
            ..connected()
        });
        assert_eq!(data.status, SyncStatus::PendingPush);
        assert_eq!(data.pending_changes, 3);
    }

    /// Reference implementation of the rule table, written as an explicit
    /// first-match search, used to check `classify` over the whole domain.
    fn first_matching_rule(p: &SyncProbe) -> SyncStatus {
        let rules: [(bool, SyncStatus); 9] = [
            (!p.is_repository, SyncStatus::LocalOnly),
            (p.remote_url.is_none(), SyncStatus::LocalOnly),
            (!p.fetch_succeeded, SyncStatus::Offline),
            (p.has_conflicts, SyncStatus::Conflict),
            (p.branch.is_none(), SyncStatus::LocalOnly),
            (p.ahead > 0 && p.behind > 0, SyncStatus::Conflict),
            (p.ahead > 0 || p.pending_changes > 0, SyncStatus::PendingPush),
            (p.behind > 0, SyncStatus::PendingPull),
            (true, SyncStatus::Synced),
        ];
        rules
            .iter()
            .find(|(matched, _)| *matched)
            .map(|(_, status)| *status)
            .unwrap_or(SyncStatus::Synced)
    }

    #[test]
    fn test_classify_is_total_and_ordered() {
        let bools = [false, true];
        let counts = [0u32, 1, 7];
        let mut seen = std::collections::HashSet::new();
        let mut cases = 0;

        for is_repository in bools {
            for has_remote in bools {
                for fetch_succeeded in bools {
                    for has_branch in bools {
                        for has_conflicts in bools {
                            for ahead in counts {
                                for behind in counts {
                                    for pending_changes in counts {
                                        let probe = SyncProbe {
                                            is_repository,
                                            remote_url: has_remote
                                                .then(|| "https://example.com/r.git".to_string()),
                                            fetch_succeeded,
                                            branch: has_branch.then(|| "main".to_string()),
                                            has_conflicts,
                                            ahead,
                                            behind,
                                            pending_changes,
                                            last_commit_at: None,
                                        };
                                        let data = classify(&probe);
                                        assert_eq!(
                                            data.status,
                                            first_matching_rule(&probe),
                                            "{:?}",
                                            probe
                                        );
                                        if !is_repository || !has_remote {
                                            assert_eq!(data.status, SyncStatus::LocalOnly);
                                            assert!(data.remote_url.is_none());
                                        }
                                        seen.insert(data.status);
                                        cases += 1;
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }

        assert_eq!(cases, 2 * 2 * 2 * 2 * 2 * 27);
        assert_eq!(seen.len(), SyncStatus::all().len());
    }

    fn path() -> PathBuf {
        PathBuf::from("/work/widgets")
    }

    #[tokio::test]
    async fn test_gather_non_repository_runs_one_query() {
        let git = Arc::new(FakeGit::new());
        git.respond("rev-parse --git-dir", GitOutput::failed("fatal: not a git repository"));
        let adapter = GitQueryAdapter::new(git.clone());

        let probe = SyncProbe::gather(&adapter, &path()).await;
        assert!(!probe.is_repository);
        assert_eq!(git.calls(), vec!["rev-parse --git-dir"]);
    }

    #[tokio::test]
    async fn test_gather_without_remote_never_fetches() {
        let git = Arc::new(FakeGit::synced_repo());
        git.respond("remote get-url origin", GitOutput::failed("error: No such remote 'origin'"));
        let adapter = GitQueryAdapter::new(git.clone());

        let probe = SyncProbe::gather(&adapter, &path()).await;
        assert_eq!(classify(&probe).status, SyncStatus::LocalOnly);
        assert_eq!(git.count("fetch origin"), 0);
    }

    #[tokio::test]
    async fn test_gather_offline_skips_divergence() {
        let git = Arc::new(FakeGit::synced_repo());
        git.respond("fetch origin", GitOutput::failed("Could not resolve host: github.com"));
        let adapter = GitQueryAdapter::new(git.clone());

        let probe = SyncProbe::gather(&adapter, &path()).await;
        assert_eq!(classify(&probe).status, SyncStatus::Offline);
        assert_eq!(git.count("rev-list origin/main..HEAD --count"), 0);
        assert_eq!(git.count("diff --name-only --diff-filter=U"), 0);
    }

    #[tokio::test]
    async fn test_gather_full_pass_order() {
        let git = Arc::new(FakeGit::synced_repo());
        let adapter = GitQueryAdapter::new(git.clone());

        let probe = SyncProbe::gather(&adapter, &path()).await;
        assert_eq!(classify(&probe).status, SyncStatus::Synced);
        assert_eq!(
            git.calls(),
            vec![
                "rev-parse --git-dir",
                "status --porcelain",
                "rev-parse --abbrev-ref HEAD",
                "remote get-url origin",
                "log -1 --format=%ct",
                "fetch origin",
                "diff --name-only --diff-filter=U",
                "rev-list origin/main..HEAD --count",
                "rev-list HEAD..origin/main --count",
            ]
        );
    }
}
