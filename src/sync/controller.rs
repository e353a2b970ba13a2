use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch, Mutex as AsyncMutex};

use super::classifier::{classify, SyncProbe};
use super::locks::PathLocks;
use super::scheduler::{FocusEvent, RefreshSubscription};
use super::status::{SyncStatus, SyncStatusData};
use crate::error::{Result, SyncError};
use crate::git::{ActionExecutor, GitQueryAdapter, GitRunner, DEFAULT_REMOTE};

/// What the UI observes: the latest snapshot plus the loading flag and the
/// latched error from the last failed action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControllerState {
    pub data: Option<SyncStatusData>,
    pub loading: bool,
    pub error: Option<String>,
}

/// Owns the sync status of one working copy.
///
/// Cloning is cheap and every clone drives the same state.
#[derive(Clone)]
pub struct SyncStatusController {
    inner: Arc<Inner>,
}

struct Inner {
    path: PathBuf,
    queries: GitQueryAdapter,
    actions: ActionExecutor,
    locks: Arc<PathLocks>,
    state: watch::Sender<ControllerState>,
    // Held for the whole of a classification pass.
    refresh_gate: AsyncMutex<()>,
    completed_passes: AtomicU64,
}

pub struct ControllerBuilder {
    path: PathBuf,
    runner: Arc<dyn GitRunner>,
    remote: String,
    locks: Option<Arc<PathLocks>>,
}

impl ControllerBuilder {
    pub fn remote(mut self, remote: impl Into<String>) -> Self {
        self.remote = remote.into();
        self
    }

    /// Use `locks` instead of the process-wide registry.
    pub fn locks(mut self, locks: Arc<PathLocks>) -> Self {
        self.locks = Some(locks);
        self
    }

    pub fn build(self) -> SyncStatusController {
        let (state, _) = watch::channel(ControllerState::default());
        SyncStatusController {
            inner: Arc::new(Inner {
                queries: GitQueryAdapter::with_remote(self.runner.clone(), self.remote.clone()),
                actions: ActionExecutor::with_remote(self.runner, self.remote),
                locks: self.locks.unwrap_or_else(PathLocks::global),
                path: self.path,
                state,
                refresh_gate: AsyncMutex::new(()),
                completed_passes: AtomicU64::new(0),
            }),
        }
    }
}

/// Clears `loading` even if the pass is cancelled half way.
struct LoadingGuard<'a> {
    state: &'a watch::Sender<ControllerState>,
}

impl<'a> LoadingGuard<'a> {
    fn begin(state: &'a watch::Sender<ControllerState>) -> Self {
        state.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });
        Self { state }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.state.send_modify(|s| s.loading = false);
    }
}

impl SyncStatusController {
    pub fn builder(path: impl Into<PathBuf>, runner: Arc<dyn GitRunner>) -> ControllerBuilder {
        ControllerBuilder {
            path: path.into(),
            runner,
            remote: DEFAULT_REMOTE.to_string(),
            locks: None,
        }
    }

    pub fn new(path: impl Into<PathBuf>, runner: Arc<dyn GitRunner>) -> Self {
        Self::builder(path, runner).build()
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    pub fn state(&self) -> ControllerState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ControllerState> {
        self.inner.state.subscribe()
    }

    pub fn queries(&self) -> &GitQueryAdapter {
        &self.inner.queries
    }

    /// Run the query pipeline and replace the snapshot.
    ///
    /// Callers arriving while a pass is running wait for it and get its
    /// result instead of starting another one, so at most one set of git
    /// queries is ever in flight for this controller.
    pub async fn refresh(&self) -> SyncStatusData {
        let inner = &self.inner;
        let observed = inner.completed_passes.load(Ordering::SeqCst);

        let _gate = inner.refresh_gate.lock().await;
        if inner.completed_passes.load(Ordering::SeqCst) != observed {
            if let Some(data) = self.state().data {
                tracing::trace!("joined in-flight refresh for {}", inner.path.display());
                return data;
            }
        }

        let loading = LoadingGuard::begin(&inner.state);
        let data = {
            let _path = inner.locks.acquire(&inner.path).await;
            let probe = SyncProbe::gather(&inner.queries, &inner.path).await;
            classify(&probe)
        };

        tracing::debug!(
            "{}: {} ({} pending)",
            inner.path.display(),
            data.status,
            data.pending_changes
        );

        inner.state.send_modify(|s| s.data = Some(data.clone()));
        inner.completed_passes.fetch_add(1, Ordering::SeqCst);
        drop(loading);

        data
    }

    fn begin_action(&self) {
        self.inner.state.send_modify(|s| s.error = None);
    }

    fn latch<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            let msg = e.to_string();
            self.inner.state.send_modify(|s| s.error = Some(msg));
        }
        result
    }

    /// Branch and remote URL from the current snapshot.
    fn tracking(&self) -> Result<(String, String)> {
        let data = self
            .state()
            .data
            .ok_or_else(|| SyncError::configuration("sync status has not been loaded yet"))?;
        let branch = data
            .branch
            .ok_or_else(|| SyncError::configuration("no branch is checked out"))?;
        let remote = data.remote_url.ok_or_else(|| {
            SyncError::configuration(format!(
                "no remote '{}' is configured",
                self.inner.queries.remote()
            ))
        })?;
        Ok((branch, remote))
    }

    pub async fn push(&self) -> Result<()> {
        self.begin_action();
        let result = self.push_inner().await;
        self.latch(result)
    }

    async fn push_inner(&self) -> Result<()> {
        let (branch, _) = self.tracking()?;
        {
            let inner = &self.inner;
            let _path = inner.locks.acquire(&inner.path).await;
            let first_push = !inner.queries.has_remote_branch(&inner.path, &branch).await;
            inner.actions.push(&inner.path, &branch, first_push).await?;
        }
        self.refresh().await;
        Ok(())
    }

    pub async fn pull(&self) -> Result<()> {
        self.begin_action();
        let result = self.pull_inner().await;
        self.latch(result)
    }

    async fn pull_inner(&self) -> Result<()> {
        let (branch, _) = self.tracking()?;
        {
            let inner = &self.inner;
            let _path = inner.locks.acquire(&inner.path).await;
            inner.actions.pull(&inner.path, &branch).await?;
        }
        self.refresh().await;
        Ok(())
    }

    /// Explicit fetch. Unlike the fetch inside `refresh`, a failure here is
    /// reported with git's stderr.
    pub async fn fetch(&self) -> Result<()> {
        self.begin_action();
        let result = async {
            self.tracking()?;
            {
                let inner = &self.inner;
                let _path = inner.locks.acquire(&inner.path).await;
                inner.actions.fetch(&inner.path).await?;
            }
            self.refresh().await;
            Ok::<(), SyncError>(())
        }
        .await;
        self.latch(result)
    }

    /// Stage and commit everything in the working tree.
    pub async fn commit_all(&self, message: &str) -> Result<()> {
        self.begin_action();
        let result = async {
            let has_branch = self.state().data.is_some_and(|d| d.branch.is_some());
            if !has_branch {
                return Err(SyncError::configuration("no branch is checked out"));
            }
            {
                let inner = &self.inner;
                let _path = inner.locks.acquire(&inner.path).await;
                inner.actions.commit_all(&inner.path, message).await?;
            }
            self.refresh().await;
            Ok::<(), SyncError>(())
        }
        .await;
        self.latch(result)
    }

    /// Push or pull depending on the current status. Conflicts are refused;
    /// every other status is a no-op.
    pub async fn sync(&self) -> Result<()> {
        let status = self.state().data.map(|d| d.status);
        match status {
            Some(SyncStatus::PendingPush) => self.push().await,
            Some(SyncStatus::PendingPull) => self.pull().await,
            Some(SyncStatus::Conflict) => {
                self.begin_action();
                self.latch(Err(SyncError::ConflictsRequireManualResolution))
            }
            _ => Ok(()),
        }
    }

    /// Refresh now, then every `interval` and on every focus gain, until the
    /// returned subscription is stopped or dropped.
    pub fn start(
        &self,
        interval: Duration,
        focus: Option<broadcast::Receiver<FocusEvent>>,
    ) -> RefreshSubscription {
        RefreshSubscription::start(self.clone(), interval, focus)
    }
}
