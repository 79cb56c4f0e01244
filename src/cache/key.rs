//! Cache keys derived from dependency manifests

use super::CacheError;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Manifest files whose contents determine the dependency set
pub const MANIFEST_FILES: &[&str] = &["Cargo.toml", "Cargo.lock"];

/// Directories never searched for manifests
const SKIPPED_DIRS: &[&str] = &["target", ".git"];

/// Key of one cache entry: `<prefix>-<os>-<toolchain>-<manifest digest>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(key: impl Into<String>) -> Result<Self, CacheError> {
        let key = key.into();
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

        if !valid {
            return Err(CacheError::InvalidKey(key));
        }
        Ok(Self(key))
    }

    /// Derive the key for a workspace and toolchain
    pub fn compute(prefix: &str, workspace: &Path, toolchain: &str) -> Result<Self, CacheError> {
        let digest = manifest_digest(workspace)?;
        Self::new(format!(
            "{}-{}-{}-{}",
            sanitize(prefix),
            std::env::consts::OS,
            sanitize(toolchain),
            digest
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// SHA-256 over every manifest in the workspace, in sorted path order
pub fn manifest_digest(workspace: &Path) -> Result<String, CacheError> {
    let mut manifests = Vec::new();
    collect_manifests(workspace, workspace, &mut manifests)?;

    if manifests.is_empty() {
        return Err(CacheError::NoManifests(workspace.to_path_buf()));
    }

    manifests.sort();

    let mut hasher = Sha256::new();
    for relative in &manifests {
        let contents = fs::read(workspace.join(relative))?;
        hasher.update(relative.to_string_lossy().replace('\\', "/").as_bytes());
        hasher.update([0u8]);
        hasher.update(&contents);
        hasher.update([0u8]);
    }

    Ok(hex::encode(hasher.finalize()))
}

fn collect_manifests(root: &Path, dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), CacheError> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let name = entry.file_name();
        let name = name.to_string_lossy();

        if file_type.is_dir() {
            if SKIPPED_DIRS.contains(&name.as_ref()) {
                continue;
            }
            collect_manifests(root, &entry.path(), out)?;
        } else if file_type.is_file() && MANIFEST_FILES.contains(&name.as_ref()) {
            if let Ok(relative) = entry.path().strip_prefix(root) {
                out.push(relative.to_path_buf());
            }
        }
    }
    Ok(())
}
