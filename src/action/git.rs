//! Thin async wrapper over the git command line

use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Error)]
pub enum GitError {
    #[error("failed to run git {args}: {source}")]
    Spawn {
        args: String,
        #[source]
        source: std::io::Error,
    },

    #[error("git {args} exited with code {code}: {stderr}")]
    Failed {
        args: String,
        code: i32,
        stderr: String,
    },

    #[error("git {0} produced non-UTF-8 output")]
    NonUtf8(String),

    #[error("{0} is not inside a git repository")]
    NotARepository(PathBuf),
}

/// Git commands scoped to one working tree
#[derive(Debug, Clone)]
pub struct GitCli {
    root: PathBuf,
}

impl GitCli {
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Find the top of the working tree containing `dir`
    pub async fn discover(dir: &Path) -> Result<Self, GitError> {
        let probe = Self::at(dir);
        match probe.run(&["rev-parse", "--show-toplevel"]).await {
            Ok(top) => Ok(Self::at(top.trim_end())),
            Err(GitError::Failed { .. }) => Err(GitError::NotARepository(dir.to_path_buf())),
            Err(e) => Err(e),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Paths of every tracked file, relative to the root
    pub async fn tracked_files(&self) -> Result<Vec<String>, GitError> {
        let out = self.run(&["ls-files", "-z"]).await?;
        Ok(out
            .split('\0')
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// `git status --porcelain`; empty when the tree is clean
    pub async fn status_porcelain(&self, include_untracked: bool) -> Result<String, GitError> {
        let untracked = if include_untracked {
            "--untracked-files=all"
        } else {
            "--untracked-files=no"
        };
        self.run(&["status", "--porcelain", untracked]).await
    }

    /// Resolve a revision to a full commit id
    pub async fn rev_parse(&self, revision: &str) -> Result<String, GitError> {
        let object = format!("{}^{{commit}}", revision);
        let out = self.run(&["rev-parse", "--verify", "--quiet", &object]).await?;
        Ok(out.trim().to_string())
    }

    /// Current branch name, or `None` on a detached HEAD
    pub async fn current_branch(&self) -> Result<Option<String>, GitError> {
        let out = self.run(&["rev-parse", "--abbrev-ref", "HEAD"]).await?;
        let branch = out.trim();
        if branch.is_empty() || branch == "HEAD" {
            Ok(None)
        } else {
            Ok(Some(branch.to_string()))
        }
    }

    /// Clone this repository into `dest` and detach at `commit`
    pub async fn snapshot_into(&self, dest: &Path, commit: &str) -> Result<GitCli, GitError> {
        let source = self.root.to_string_lossy().into_owned();
        let target = dest.to_string_lossy().into_owned();
        self.run(&["clone", "--quiet", "--no-checkout", &source, &target])
            .await?;

        let snapshot = GitCli::at(dest);
        snapshot
            .run(&["checkout", "--quiet", "--detach", commit])
            .await?;
        Ok(snapshot)
    }

    async fn run(&self, args: &[&str]) -> Result<String, GitError> {
        let joined = args.join(" ");
        debug!("git -C {} {}", self.root.display(), joined);

        let output = Command::new("git")
            .arg("-C")
            .arg(&self.root)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| GitError::Spawn {
                args: joined.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(GitError::Failed {
                args: joined,
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        String::from_utf8(output.stdout).map_err(|_| GitError::NonUtf8(joined))
    }
}
