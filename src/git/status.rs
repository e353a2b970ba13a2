use serde::{Deserialize, Serialize};

/// Breakdown of `git status --porcelain` by index/worktree column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingTreeStatus {
    /// Paths with changes recorded in the index
    pub staged: Vec<String>,
    /// Paths with changes in the worktree not yet staged
    pub unstaged: Vec<String>,
    /// Paths git does not track
    pub untracked: Vec<String>,
}

impl WorkingTreeStatus {
    pub fn parse_porcelain(text: &str) -> Self {
        let mut status = Self::default();

        for line in text.lines() {
            if line.len() < 4 || !line.is_char_boundary(2) {
                continue;
            }

            let (code, rest) = line.split_at(2);
            let path = rest.trim_start();
            // Renames and copies are reported as "old -> new".
            let path = path.rsplit(" -> ").next().unwrap_or(path).to_string();

            let mut chars = code.chars();
            let index = chars.next().unwrap_or(' ');
            let worktree = chars.next().unwrap_or(' ');

            if index == '?' && worktree == '?' {
                status.untracked.push(path);
                continue;
            }
            if index != ' ' {
                status.staged.push(path.clone());
            }
            if worktree != ' ' {
                status.unstaged.push(path);
            }
        }

        status
    }

    pub fn is_clean(&self) -> bool {
        self.staged.is_empty() && self.unstaged.is_empty() && self.untracked.is_empty()
    }

    pub fn format_short(&self) -> String {
        format!(
            "+{} ~{} ?{}",
            self.staged.len(),
            self.unstaged.len(),
            self.untracked.len()
        )
    }
}
