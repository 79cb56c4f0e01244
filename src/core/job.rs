//! Jobs - ordered step lists that run as one unit

use crate::core::config::{JobConfig, DEFAULT_TIMEOUT_MINUTES};
use crate::core::state::{JobState, StepState};
use crate::core::step::Step;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub name: String,

    /// Job-level environment
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,

    pub steps: Vec<Step>,

    /// Wall-clock ceiling for the whole job
    pub timeout_minutes: u64,

    pub state: JobState,
}

impl Job {
    pub fn new(id: impl Into<String>, steps: Vec<Step>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            env: BTreeMap::new(),
            steps,
            timeout_minutes: DEFAULT_TIMEOUT_MINUTES,
            state: JobState::Pending,
        }
    }

    pub fn from_config(id: &str, config: &JobConfig) -> Result<Self> {
        let steps = config
            .steps
            .iter()
            .map(Step::from_config)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            id: id.to_string(),
            name: config.name.clone().unwrap_or_else(|| id.to_string()),
            env: config.env()?,
            steps,
            timeout_minutes: config.timeout_minutes,
            state: JobState::Pending,
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_minutes.saturating_mul(60))
    }

    pub fn is_success(&self) -> bool {
        self.state.is_success()
    }

    /// A fresh copy of this job with every state reset to pending
    pub fn reset(&self) -> Self {
        let mut job = self.clone();
        job.state = JobState::Pending;
        for step in &mut job.steps {
            step.state = StepState::Pending;
        }
        job
    }
}
