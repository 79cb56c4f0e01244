//! Workflow - trigger filter plus the job graph it instantiates

use crate::core::config::WorkflowConfig;
use crate::core::job::Job;
use crate::core::trigger::{TriggerDecision, TriggerEvent, TriggerFilter};
use anyhow::Result;
use std::collections::BTreeMap;

/// A validated workflow definition
///
/// Jobs are independent of each other; there is no ordering edge between
/// them, so any subset can run concurrently.
#[derive(Debug, Clone)]
pub struct Workflow {
    pub name: String,
    pub env: BTreeMap<String, String>,
    pub trigger: TriggerFilter,
    jobs: Vec<Job>,
}

impl Workflow {
    pub fn new(name: impl Into<String>, trigger: TriggerFilter, jobs: Vec<Job>) -> Self {
        Self {
            name: name.into(),
            env: BTreeMap::new(),
            trigger,
            jobs,
        }
    }

    pub fn from_config(config: &WorkflowConfig) -> Result<Self> {
        let jobs = config
            .jobs()?
            .iter()
            .map(|(id, job)| Job::from_config(id, job))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name: config.name.clone(),
            env: config.env()?,
            trigger: config.trigger_filter()?,
            jobs,
        })
    }

    /// The built-in lint + build-and-test gate
    pub fn default_gate() -> Result<Self> {
        Self::from_config(&WorkflowConfig::default_gate()?)
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn job(&self, id: &str) -> Option<&Job> {
        self.jobs.iter().find(|j| j.id == id)
    }

    pub fn evaluate(&self, event: &TriggerEvent) -> TriggerDecision {
        self.trigger.evaluate(event)
    }

    /// Fresh pending jobs for one run; an empty selection means every job
    pub fn instantiate(&self, selection: &[String]) -> Result<Vec<Job>> {
        for id in selection {
            if self.job(id).is_none() {
                let known: Vec<_> = self.jobs.iter().map(|j| j.id.as_str()).collect();
                anyhow::bail!("Unknown job '{}' (known jobs: {})", id, known.join(", "));
            }
        }

        Ok(self
            .jobs
            .iter()
            .filter(|j| selection.is_empty() || selection.contains(&j.id))
            .map(Job::reset)
            .collect())
    }
}
