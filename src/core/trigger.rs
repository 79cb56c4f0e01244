//! Trigger filter - decides whether a repository event starts the gate

use crate::core::pattern::{PatternError, PatternSet};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Branches a push must land on to start the default gate
pub const DEFAULT_PUSH_BRANCHES: &[&str] = &["main", "auto", "canary"];

/// Branches a pull request must target to start the default gate
pub const DEFAULT_PULL_REQUEST_BRANCHES: &[&str] = &["main"];

/// Kind of repository event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Push,
    PullRequest,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Push => "push",
            EventKind::PullRequest => "pull_request",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors for malformed events or filters
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TriggerError {
    #[error("{0} event has an empty source branch")]
    EmptySourceBranch(EventKind),

    #[error("pull_request event requires a non-empty target branch")]
    MissingTargetBranch,

    #[error("push event cannot carry a target branch")]
    UnexpectedTargetBranch,

    #[error(transparent)]
    Pattern(#[from] PatternError),
}

/// A repository event; always well-formed once constructed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriggerEvent {
    kind: EventKind,
    source_branch: String,
    target_branch: Option<String>,
}

impl TriggerEvent {
    pub fn new(
        kind: EventKind,
        source_branch: impl Into<String>,
        target_branch: Option<String>,
    ) -> Result<Self, TriggerError> {
        let source_branch = strip_ref_prefix(source_branch.into());
        let target_branch = target_branch.map(strip_ref_prefix);

        if source_branch.trim().is_empty() {
            return Err(TriggerError::EmptySourceBranch(kind));
        }

        match (kind, &target_branch) {
            (EventKind::Push, Some(_)) => return Err(TriggerError::UnexpectedTargetBranch),
            (EventKind::PullRequest, None) => return Err(TriggerError::MissingTargetBranch),
            (EventKind::PullRequest, Some(t)) if t.trim().is_empty() => {
                return Err(TriggerError::MissingTargetBranch)
            }
            _ => {}
        }

        Ok(Self {
            kind,
            source_branch,
            target_branch,
        })
    }

    pub fn push(branch: impl Into<String>) -> Result<Self, TriggerError> {
        Self::new(EventKind::Push, branch, None)
    }

    pub fn pull_request(
        source_branch: impl Into<String>,
        target_branch: impl Into<String>,
    ) -> Result<Self, TriggerError> {
        Self::new(EventKind::PullRequest, source_branch, Some(target_branch.into()))
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn source_branch(&self) -> &str {
        &self.source_branch
    }

    pub fn target_branch(&self) -> Option<&str> {
        self.target_branch.as_deref()
    }

    /// The branch the filter inspects: the pushed branch, or the pull
    /// request's base branch
    pub fn filtered_branch(&self) -> &str {
        match self.kind {
            EventKind::Push => &self.source_branch,
            EventKind::PullRequest => self.target_branch.as_deref().unwrap_or_default(),
        }
    }
}

impl fmt::Display for TriggerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target_branch {
            Some(target) => write!(f, "{} {} -> {}", self.kind, self.source_branch, target),
            None => write!(f, "{} to {}", self.kind, self.source_branch),
        }
    }
}

fn strip_ref_prefix(branch: String) -> String {
    match branch.strip_prefix("refs/heads/") {
        Some(rest) => rest.to_string(),
        None => branch,
    }
}

/// Outcome of evaluating an event against the filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum TriggerDecision {
    Run,
    Skip { reason: String },
}

impl TriggerDecision {
    pub fn is_run(&self) -> bool {
        matches!(self, TriggerDecision::Run)
    }
}

/// Branch filter for one event kind
#[derive(Debug, Clone)]
pub enum BranchFilter {
    /// Every branch triggers
    Any,
    /// Only branches matching one of the patterns trigger
    Only(PatternSet),
}

impl BranchFilter {
    pub fn only<I, S>(patterns: I) -> Result<Self, TriggerError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(BranchFilter::Only(PatternSet::new(patterns)?))
    }

    pub fn matches(&self, branch: &str) -> bool {
        match self {
            BranchFilter::Any => true,
            BranchFilter::Only(set) => set.is_match(branch),
        }
    }
}

/// Decides from an event whether the job graph is instantiated
///
/// An event kind with no filter never triggers.
#[derive(Debug, Clone, Default)]
pub struct TriggerFilter {
    push: Option<BranchFilter>,
    pull_request: Option<BranchFilter>,
}

impl TriggerFilter {
    /// A filter that triggers on nothing
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_push(mut self, filter: BranchFilter) -> Self {
        self.push = Some(filter);
        self
    }

    pub fn with_pull_request(mut self, filter: BranchFilter) -> Self {
        self.pull_request = Some(filter);
        self
    }

    /// Push to main/auto/canary, or a pull request into main
    pub fn default_gate() -> Result<Self, TriggerError> {
        Ok(Self::new()
            .with_push(BranchFilter::only(DEFAULT_PUSH_BRANCHES)?)
            .with_pull_request(BranchFilter::only(DEFAULT_PULL_REQUEST_BRANCHES)?))
    }

    pub fn filter_for(&self, kind: EventKind) -> Option<&BranchFilter> {
        match kind {
            EventKind::Push => self.push.as_ref(),
            EventKind::PullRequest => self.pull_request.as_ref(),
        }
    }

    pub fn evaluate(&self, event: &TriggerEvent) -> TriggerDecision {
        let branch = event.filtered_branch();

        match self.filter_for(event.kind()) {
            None => TriggerDecision::Skip {
                reason: format!("workflow does not run on {} events", event.kind()),
            },
            Some(filter) if filter.matches(branch) => TriggerDecision::Run,
            Some(_) => TriggerDecision::Skip {
                reason: match event.kind() {
                    EventKind::Push => format!("push to '{}' is not a gated branch", branch),
                    EventKind::PullRequest => {
                        format!("pull request targets '{}', not a gated branch", branch)
                    }
                },
            },
        }
    }
}
