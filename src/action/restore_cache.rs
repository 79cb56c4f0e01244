//! `cache` - restore build artifacts keyed by the dependency manifests

use crate::action::{Action, ActionError, ActionOutput, Invocation};
use crate::cache::{CacheError, CacheKey, CacheLookup};
use crate::core::JobContext;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{info, warn};

pub const DEFAULT_PREFIX: &str = "cargo";
pub const DEFAULT_PATHS: &[&str] = &["target"];

/// Key prefix a job uses when the step names none
///
/// Jobs build different artifacts from the same manifests, so each job
/// gets its own entry unless a shared `prefix` is given explicitly.
pub fn job_prefix(job_id: &str) -> String {
    format!("{}-{}", DEFAULT_PREFIX, job_id)
}

/// Inputs: `prefix` (default `cargo-<job>`), `paths` (default `target`),
/// `toolchain` (default: the job's selected toolchain)
///
/// On a miss the entry is scheduled for saving; the job runner stores it
/// only if the whole job succeeds. Neither a miss nor an unreadable cache
/// fails the step.
#[derive(Debug, Clone, Copy, Default)]
pub struct RestoreCache;

#[async_trait]
impl Action for RestoreCache {
    fn name(&self) -> &str {
        "cache"
    }

    async fn run(
        &self,
        invocation: &Invocation<'_>,
        ctx: &mut JobContext,
    ) -> Result<ActionOutput, ActionError> {
        let workspace = ctx.workspace().ok_or(ActionError::NoWorkspace)?.to_path_buf();
        let prefix = invocation
            .input("prefix")
            .map(str::to_string)
            .unwrap_or_else(|| job_prefix(&ctx.job_id));
        let toolchain = invocation
            .input("toolchain")
            .map(str::to_string)
            .or_else(|| ctx.toolchain.clone())
            .unwrap_or_else(|| "default".to_string());

        let mut paths: Vec<PathBuf> = invocation
            .list_input("paths")
            .into_iter()
            .map(PathBuf::from)
            .collect();
        if paths.is_empty() {
            paths = DEFAULT_PATHS.iter().map(PathBuf::from).collect();
        }
        let escapes = |p: &&PathBuf| {
            p.is_absolute() || p.components().any(|c| c.as_os_str() == "..")
        };
        if let Some(bad) = paths.iter().find(escapes) {
            return Err(ActionError::InvalidInput {
                input: "paths".to_string(),
                value: bad.display().to_string(),
            });
        }

        let key = match CacheKey::compute(&prefix, &workspace, &toolchain) {
            Ok(key) => key,
            Err(CacheError::NoManifests(_)) => {
                warn!("Job {}: no dependency manifests, caching disabled", ctx.job_id);
                return Ok(ActionOutput::success(
                    "No Cargo.toml or Cargo.lock found; caching disabled\n",
                ));
            }
            Err(e) => return Err(e.into()),
        };

        let log = match ctx.cache.get(&key, &workspace).await {
            Ok(CacheLookup::Hit) => {
                info!("Job {} restored cache {}", ctx.job_id, key);
                ctx.record_cache_lookup(key.clone(), true);
                format!("Cache restored from key: {}\n", key)
            }
            Ok(CacheLookup::Miss) => {
                info!("Job {} cache miss for {}", ctx.job_id, key);
                ctx.record_cache_lookup(key.clone(), false);
                ctx.schedule_cache_save(key.clone(), paths);
                format!("Cache not found for key: {}\n", key)
            }
            Err(e) => {
                warn!("Job {}: cache read failed for {}: {}", ctx.job_id, key, e);
                ctx.record_cache_lookup(key.clone(), false);
                ctx.schedule_cache_save(key.clone(), paths);
                format!("Cache unavailable for key: {} ({}); building from scratch\n", key, e)
            }
        };

        Ok(ActionOutput::success(log))
    }
}
