//! Dependency cache - content-addressed build artifact snapshots
//!
//! Entries are keyed by a digest of the workspace's dependency manifests,
//! so jobs that resolve the same dependency set share an entry. The store
//! only supports whole-entry `get` and `put`; there is no eviction or
//! partial update.

pub mod fs;
pub mod key;

pub use fs::FsCache;
pub use key::{manifest_digest, CacheKey};

use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid cache key '{0}'")]
    InvalidKey(String),

    #[error("no dependency manifests found under {0}")]
    NoManifests(PathBuf),

    #[error("cache task failed: {0}")]
    Task(String),
}

/// Outcome of a lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheLookup {
    /// The snapshot was restored into the destination
    Hit,
    Miss,
}

/// Outcome of a store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PutOutcome {
    Stored,
    /// An entry with this key already exists; entries are immutable
    AlreadyPresent,
    /// None of the requested paths existed
    NothingToStore,
}

/// Storage shared by concurrent jobs
#[async_trait]
pub trait DependencyCache: Send + Sync {
    /// Restore the snapshot for `key` into `dest`
    async fn get(&self, key: &CacheKey, dest: &Path) -> Result<CacheLookup, CacheError>;

    /// Snapshot `paths` (relative to `workspace`) under `key`
    async fn put(
        &self,
        key: &CacheKey,
        workspace: &Path,
        paths: &[PathBuf],
    ) -> Result<PutOutcome, CacheError>;
}

/// A cache that never hits and never stores
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledCache;

#[async_trait]
impl DependencyCache for DisabledCache {
    async fn get(&self, _key: &CacheKey, _dest: &Path) -> Result<CacheLookup, CacheError> {
        Ok(CacheLookup::Miss)
    }

    async fn put(
        &self,
        _key: &CacheKey,
        _workspace: &Path,
        _paths: &[PathBuf],
    ) -> Result<PutOutcome, CacheError> {
        Ok(PutOutcome::NothingToStore)
    }
}
