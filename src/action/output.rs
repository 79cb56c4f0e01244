//! Action results and errors

use crate::action::git::GitError;
use crate::cache::CacheError;
use crate::lint::LintError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that keep an action from producing an exit status
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("unknown action '{0}'")]
    UnknownAction(String),

    #[error("action '{name}' has no version '{version}' (available: {available})")]
    UnsupportedVersion {
        name: String,
        version: String,
        available: String,
    },

    #[error("missing required input '{0}'")]
    MissingInput(String),

    #[error("invalid value '{value}' for input '{input}'")]
    InvalidInput { input: String, value: String },

    #[error("no workspace: a checkout step must run first")]
    NoWorkspace,

    #[error("failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("timed out after {0} seconds")]
    Timeout(u64),

    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Lint(#[from] LintError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// What an action reports back: an exit status and its captured log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOutput {
    pub exit_code: i32,
    pub log: String,
}

impl ActionOutput {
    pub fn new(exit_code: i32, log: impl Into<String>) -> Self {
        Self {
            exit_code,
            log: log.into(),
        }
    }

    pub fn success(log: impl Into<String>) -> Self {
        Self::new(0, log)
    }

    pub fn failure(exit_code: i32, log: impl Into<String>) -> Self {
        Self::new(exit_code, log)
    }

    pub fn passed(&self) -> bool {
        self.exit_code == 0
    }
}
