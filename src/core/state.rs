//! Execution state models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Overall status of one gate run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    /// Every job succeeded
    Succeeded,
    /// At least one job failed
    Failed,
    /// The trigger filter rejected the event; no jobs were created
    Skipped,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("invalid job state transition: {from} -> {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },
}

/// Lifecycle of a job: pending -> running -> {succeeded, failed}
///
/// Transitions only move forward; terminal states are final.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Running {
        started_at: DateTime<Utc>,
    },
    Succeeded {
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    },
    Failed {
        failed_step: Option<String>,
        error: String,
        started_at: DateTime<Utc>,
        failed_at: DateTime<Utc>,
    },
}

impl JobState {
    pub fn label(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Running { .. } => "running",
            JobState::Succeeded { .. } => "succeeded",
            JobState::Failed { .. } => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Succeeded { .. } | JobState::Failed { .. })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, JobState::Succeeded { .. })
    }

    pub fn start(&mut self) -> Result<(), StateError> {
        match self {
            JobState::Pending => {
                *self = JobState::Running {
                    started_at: Utc::now(),
                };
                Ok(())
            }
            other => Err(StateError::InvalidTransition {
                from: other.label(),
                to: "running",
            }),
        }
    }

    pub fn succeed(&mut self) -> Result<(), StateError> {
        match self {
            JobState::Running { started_at } => {
                *self = JobState::Succeeded {
                    started_at: *started_at,
                    completed_at: Utc::now(),
                };
                Ok(())
            }
            other => Err(StateError::InvalidTransition {
                from: other.label(),
                to: "succeeded",
            }),
        }
    }

    pub fn fail(
        &mut self,
        failed_step: Option<String>,
        error: impl Into<String>,
    ) -> Result<(), StateError> {
        match self {
            JobState::Running { started_at } => {
                *self = JobState::Failed {
                    failed_step,
                    error: error.into(),
                    started_at: *started_at,
                    failed_at: Utc::now(),
                };
                Ok(())
            }
            other => Err(StateError::InvalidTransition {
                from: other.label(),
                to: "failed",
            }),
        }
    }
}

/// State of a single step within a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum StepState {
    Pending,
    Running {
        started_at: DateTime<Utc>,
    },
    Passed {
        output: String,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    },
    Failed {
        error: String,
        exit_code: Option<i32>,
        output: String,
        /// Test names reported as failing in the step output
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        failing_tests: Vec<String>,
        started_at: DateTime<Utc>,
        failed_at: DateTime<Utc>,
    },
    /// Not executed because an earlier step in the job failed
    Skipped {
        reason: String,
    },
}

impl StepState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StepState::Passed { .. } | StepState::Failed { .. } | StepState::Skipped { .. }
        )
    }

    pub fn is_passed(&self) -> bool {
        matches!(self, StepState::Passed { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, StepState::Failed { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, StepState::Skipped { .. })
    }

    /// Captured log for a finished step
    pub fn output(&self) -> Option<&str> {
        match self {
            StepState::Passed { output, .. } | StepState::Failed { output, .. } => Some(output),
            _ => None,
        }
    }
}
