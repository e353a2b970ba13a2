use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Relationship between a working copy and its remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    LocalOnly,
    Synced,
    PendingPush,
    PendingPull,
    Conflict,
    Offline,
}

impl SyncStatus {
    pub fn label(&self) -> &'static str {
        match self {
            SyncStatus::LocalOnly => "Local only",
            SyncStatus::Synced => "Synced",
            SyncStatus::PendingPush => "Pending push",
            SyncStatus::PendingPull => "Pending pull",
            SyncStatus::Conflict => "Conflict",
            SyncStatus::Offline => "Offline",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            SyncStatus::LocalOnly => "○",
            SyncStatus::Synced => "✓",
            SyncStatus::PendingPush => "↑",
            SyncStatus::PendingPull => "↓",
            SyncStatus::Conflict => "✗",
            SyncStatus::Offline => "⚠",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::LocalOnly => "local_only",
            SyncStatus::Synced => "synced",
            SyncStatus::PendingPush => "pending_push",
            SyncStatus::PendingPull => "pending_pull",
            SyncStatus::Conflict => "conflict",
            SyncStatus::Offline => "offline",
        }
    }

    pub fn all() -> &'static [SyncStatus] {
        &[
            SyncStatus::LocalOnly,
            SyncStatus::Synced,
            SyncStatus::PendingPush,
            SyncStatus::PendingPull,
            SyncStatus::Conflict,
            SyncStatus::Offline,
        ]
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable snapshot produced by one classification pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatusData {
    pub status: SyncStatus,
    /// Latest local commit time; only set when a remote exists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_synced_at: Option<DateTime<Utc>>,
    /// Modified, staged and untracked paths in the working tree
    #[serde(default)]
    pub pending_changes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

impl SyncStatusData {
    /// Snapshot for a path that is not a git repository.
    pub fn not_a_repository() -> Self {
        Self {
            status: SyncStatus::LocalOnly,
            last_synced_at: None,
            pending_changes: 0,
            remote_url: None,
            branch: None,
        }
    }

    pub fn format_short(&self) -> String {
        let mut out = format!("{} {}", self.status.symbol(), self.status.label());
        if let Some(branch) = &self.branch {
            out.push_str(&format!(" [{}]", branch));
        }
        if self.pending_changes > 0 {
            out.push_str(&format!(" {} pending", self.pending_changes));
        }
        out
    }
}
