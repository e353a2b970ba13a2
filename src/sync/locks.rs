use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// One async mutex per working copy. Every git invocation (read or write)
/// against a path happens while holding that path's guard, so subprocesses
/// for the same working copy never interleave.
#[derive(Debug, Default)]
pub struct PathLocks {
    locks: Mutex<HashMap<PathBuf, Arc<AsyncMutex<()>>>>,
}

pub type PathGuard = OwnedMutexGuard<()>;

static GLOBAL: OnceLock<Arc<PathLocks>> = OnceLock::new();

impl PathLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry shared by every controller in the process unless one is
    /// given explicitly.
    pub fn global() -> Arc<PathLocks> {
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(PathLocks::new())))
    }

    fn lock_for(&self, path: &Path) -> Arc<AsyncMutex<()>> {
        let key = canonical_key(path);
        let mut locks = match self.locks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        locks.entry(key).or_default().clone()
    }

    pub async fn acquire(&self, path: &Path) -> PathGuard {
        self.lock_for(path).lock_owned().await
    }

    /// Drop entries nobody is holding or waiting on.
    pub fn prune(&self) {
        let mut locks = match self.locks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    pub fn len(&self) -> usize {
        self.locks.lock().map(|l| l.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Canonical form of a working-copy path, so `./repo` and `/abs/repo` share
/// a lock. Paths that do not exist are used as given.
pub fn canonical_key(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
