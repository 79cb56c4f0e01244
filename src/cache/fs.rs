use super::{CacheError, CacheKey, CacheLookup, DependencyCache, PutOutcome};
use async_trait::async_trait;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable overriding the default cache directory
pub const CACHE_DIR_ENV: &str = "MERGE_GATE_CACHE_DIR";

/// Filesystem-backed dependency cache
///
/// Layout: `<root>/<key>/<path relative to the workspace>`. An entry is
/// staged in a temporary directory next to its final location and moved
/// into place with a single rename, so readers never see a partial entry
/// and the first writer for a key wins.
#[derive(Debug, Clone)]
pub struct FsCache {
    root: PathBuf,
}

impl FsCache {
    /// Create a cache rooted at `root`, creating the directory if needed
    pub fn new(root: impl AsRef<Path>) -> Result<Self, CacheError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// `$MERGE_GATE_CACHE_DIR`, else the platform cache dir
    pub fn with_default_path() -> Result<Self, CacheError> {
        Self::new(default_cache_dir())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.root.join(key.as_str())
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entry_path(key).is_dir()
    }
}

pub fn default_cache_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(CACHE_DIR_ENV) {
        return PathBuf::from(dir);
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("merge-gate")
}

#[async_trait]
impl DependencyCache for FsCache {
    async fn get(&self, key: &CacheKey, dest: &Path) -> Result<CacheLookup, CacheError> {
        let entry = self.entry_path(key);
        let dest = dest.to_path_buf();

        tokio::task::spawn_blocking(move || {
            if !entry.is_dir() {
                return Ok(CacheLookup::Miss);
            }
            debug!("Restoring cache entry {} into {}", entry.display(), dest.display());
            copy_dir_contents(&entry, &dest)?;
            Ok(CacheLookup::Hit)
        })
        .await
        .map_err(|e| CacheError::Task(e.to_string()))?
    }

    async fn put(
        &self,
        key: &CacheKey,
        workspace: &Path,
        paths: &[PathBuf],
    ) -> Result<PutOutcome, CacheError> {
        let root = self.root.clone();
        let entry = self.entry_path(key);
        let workspace = workspace.to_path_buf();
        let paths = paths.to_vec();

        tokio::task::spawn_blocking(move || store_entry(&root, &entry, &workspace, &paths))
            .await
            .map_err(|e| CacheError::Task(e.to_string()))?
    }
}

fn store_entry(
    root: &Path,
    entry: &Path,
    workspace: &Path,
    paths: &[PathBuf],
) -> Result<PutOutcome, CacheError> {
    if entry.exists() {
        return Ok(PutOutcome::AlreadyPresent);
    }

    let staging = tempfile::Builder::new()
        .prefix(".staging-")
        .tempdir_in(root)?;

    let mut stored_any = false;
    for relative in paths {
        let source = workspace.join(relative);
        if !source.exists() {
            debug!("Cache path {} does not exist, skipping", source.display());
            continue;
        }
        copy_path(&source, &staging.path().join(relative))?;
        stored_any = true;
    }

    if !stored_any {
        return Ok(PutOutcome::NothingToStore);
    }

    match fs::rename(staging.path(), entry) {
        Ok(()) => Ok(PutOutcome::Stored),
        // Another job stored the same key first
        Err(_) if entry.exists() => Ok(PutOutcome::AlreadyPresent),
        Err(e) => {
            warn!("Failed to move cache entry into {}: {}", entry.display(), e);
            Err(e.into())
        }
    }
}

fn copy_dir_contents(from: &Path, to: &Path) -> io::Result<()> {
    fs::create_dir_all(to)?;
    for entry in fs::read_dir(from)? {
        let entry = entry?;
        copy_path(&entry.path(), &to.join(entry.file_name()))?;
    }
    Ok(())
}

fn copy_path(from: &Path, to: &Path) -> io::Result<()> {
    let metadata = fs::symlink_metadata(from)?;
    let file_type = metadata.file_type();

    if file_type.is_dir() {
        copy_dir_contents(from, to)
    } else if file_type.is_symlink() {
        copy_symlink(from, to)
    } else {
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(from, to).map(|_| ())
    }
}

#[cfg(unix)]
fn copy_symlink(from: &Path, to: &Path) -> io::Result<()> {
    let target = fs::read_link(from)?;
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }
    if fs::symlink_metadata(to).is_ok() {
        fs::remove_file(to)?;
    }
    std::os::unix::fs::symlink(target, to)
}

#[cfg(not(unix))]
fn copy_symlink(from: &Path, _to: &Path) -> io::Result<()> {
    debug!("Skipping symlink {}", from.display());
    Ok(())
}
