//! Mapping from project identifiers to working-copy paths.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use git2::Repository;

/// Something that knows where a project lives on disk.
pub trait ProjectDirectory: Send + Sync {
    fn resolve(&self, project_id: &str) -> Option<PathBuf>;

    /// Every known project, sorted by id.
    fn projects(&self) -> Vec<(String, PathBuf)>;
}

/// Projects declared in the `[projects]` table of the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredProjects {
    entries: BTreeMap<String, PathBuf>,
}

impl ConfiguredProjects {
    pub fn new(entries: BTreeMap<String, PathBuf>) -> Self {
        let entries = entries
            .into_iter()
            .map(|(id, path)| (id, expand_home(&path)))
            .collect();
        Self { entries }
    }
}

impl ProjectDirectory for ConfiguredProjects {
    fn resolve(&self, project_id: &str) -> Option<PathBuf> {
        self.entries.get(project_id).cloned()
    }

    fn projects(&self) -> Vec<(String, PathBuf)> {
        self.entries
            .iter()
            .map(|(id, path)| (id.clone(), path.clone()))
            .collect()
    }
}

/// Top of the working copy containing `path`, or `path` itself when it is
/// not inside a repository (it is then reported as local-only).
pub fn resolve_working_copy(path: &Path) -> PathBuf {
    match Repository::discover(path) {
        Ok(repo) => match repo.workdir() {
            Some(workdir) => workdir.to_path_buf(),
            None => path.to_path_buf(),
        },
        Err(e) => {
            tracing::debug!("{} is not inside a repository: {}", path.display(), e.message());
            path.to_path_buf()
        }
    }
}

fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}
