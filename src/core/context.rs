//! Job context - per-job runtime state shared by its steps

use crate::cache::{CacheKey, DependencyCache};
use crate::core::step::Step;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// The repository and revision a run verifies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSource {
    pub path: PathBuf,
    pub revision: String,
}

impl RepoSource {
    pub fn new(path: impl Into<PathBuf>, revision: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            revision: revision.into(),
        }
    }
}

/// Cache entry to populate once the job has succeeded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCacheSave {
    pub key: CacheKey,
    pub paths: Vec<PathBuf>,
}

/// Result of one cache lookup made by a step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLookupRecord {
    pub key: CacheKey,
    pub hit: bool,
}

/// Execution context for one job
///
/// Owns the job's isolated checkout; dropping the context removes it.
pub struct JobContext {
    pub job_id: String,
    pub source: RepoSource,

    /// Environment visible to every step of the job
    pub env: BTreeMap<String, String>,

    /// Toolchain selected by a toolchain step
    pub toolchain: Option<String>,

    pub cache: Arc<dyn DependencyCache>,

    /// Variables exported by actions; these win over step env
    exported: BTreeMap<String, String>,
    workspace: Option<PathBuf>,
    checkout: Option<TempDir>,
    pending_cache_saves: Vec<PendingCacheSave>,
    cache_lookups: Vec<CacheLookupRecord>,
}

impl JobContext {
    pub fn new(
        job_id: impl Into<String>,
        source: RepoSource,
        env: BTreeMap<String, String>,
        cache: Arc<dyn DependencyCache>,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            source,
            env,
            toolchain: None,
            cache,
            exported: BTreeMap::new(),
            workspace: None,
            checkout: None,
            pending_cache_saves: Vec::new(),
            cache_lookups: Vec::new(),
        }
    }

    /// Directory steps run in, once a checkout exists
    pub fn workspace(&self) -> Option<&Path> {
        self.workspace.as_deref()
    }

    /// Install a checkout owned by this job
    pub fn set_checkout(&mut self, dir: TempDir, workspace: PathBuf) {
        self.workspace = Some(workspace);
        self.checkout = Some(dir);
    }

    /// Point the job at an existing directory it does not own
    pub fn set_workspace(&mut self, workspace: PathBuf) {
        self.workspace = Some(workspace);
        self.checkout = None;
    }

    /// Make a variable visible to every later step
    pub fn export_env(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.exported.insert(key.into(), value.into());
    }

    pub fn exported_env(&self) -> &BTreeMap<String, String> {
        &self.exported
    }

    /// Effective environment for a step: job env, then step env, then
    /// variables exported by earlier actions
    pub fn step_env(&self, step: &Step) -> BTreeMap<String, String> {
        let mut env = self.env.clone();
        env.extend(step.env.iter().map(|(k, v)| (k.clone(), v.clone())));
        env.extend(self.exported.iter().map(|(k, v)| (k.clone(), v.clone())));
        env
    }

    pub fn schedule_cache_save(&mut self, key: CacheKey, paths: Vec<PathBuf>) {
        if self.pending_cache_saves.iter().any(|p| p.key == key) {
            return;
        }
        self.pending_cache_saves.push(PendingCacheSave { key, paths });
    }

    pub fn take_pending_cache_saves(&mut self) -> Vec<PendingCacheSave> {
        std::mem::take(&mut self.pending_cache_saves)
    }

    pub fn record_cache_lookup(&mut self, key: CacheKey, hit: bool) {
        self.cache_lookups.push(CacheLookupRecord { key, hit });
    }

    pub fn take_cache_lookups(&mut self) -> Vec<CacheLookupRecord> {
        std::mem::take(&mut self.cache_lookups)
    }
}

impl std::fmt::Debug for JobContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobContext")
            .field("job_id", &self.job_id)
            .field("source", &self.source)
            .field("workspace", &self.workspace)
            .field("toolchain", &self.toolchain)
            .finish_non_exhaustive()
    }
}
