use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::controller::SyncStatusController;
use super::locks::{canonical_key, PathLocks};
use super::status::SyncStatusData;
use crate::git::{GitRunner, DEFAULT_REMOTE};

/// One controller per working copy, all on the process-wide lock registry.
pub struct SyncHub {
    runner: Arc<dyn GitRunner>,
    remote: String,
    locks: Arc<PathLocks>,
    controllers: HashMap<PathBuf, SyncStatusController>,
}

impl SyncHub {
    pub fn new(runner: Arc<dyn GitRunner>) -> Self {
        Self::with_remote(runner, DEFAULT_REMOTE)
    }

    pub fn with_remote(runner: Arc<dyn GitRunner>, remote: impl Into<String>) -> Self {
        Self {
            runner,
            remote: remote.into(),
            locks: PathLocks::global(),
            controllers: HashMap::new(),
        }
    }

    /// Controller for `path`, created on first use.
    pub fn controller(&mut self, path: &Path) -> SyncStatusController {
        let key = canonical_key(path);
        if let Some(existing) = self.controllers.get(&key) {
            return existing.clone();
        }

        tracing::debug!("tracking {}", key.display());
        let controller = SyncStatusController::builder(key.clone(), self.runner.clone())
            .remote(self.remote.clone())
            .locks(self.locks.clone())
            .build();
        self.controllers.insert(key, controller.clone());
        controller
    }

    pub fn get(&self, path: &Path) -> Option<&SyncStatusController> {
        self.controllers.get(&canonical_key(path))
    }

    pub fn remove(&mut self, path: &Path) -> Option<SyncStatusController> {
        let removed = self.controllers.remove(&canonical_key(path));
        self.locks.prune();
        removed
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.controllers.keys().cloned().collect();
        paths.sort();
        paths
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    /// Refresh every tracked working copy, one after another.
    pub async fn refresh_all(&self) -> Vec<(PathBuf, SyncStatusData)> {
        let mut results = Vec::with_capacity(self.controllers.len());
        for path in self.paths() {
            if let Some(controller) = self.controllers.get(&path) {
                results.push((path, controller.refresh().await));
            }
        }
        results
    }
}
