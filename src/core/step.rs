//! Step definitions

use crate::core::config::StepConfig;
use crate::core::state::StepState;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Reference to a reusable action, written `name@version`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionRef {
    pub name: String,
    pub version: String,
}

impl ActionRef {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl FromStr for ActionRef {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (name, version) = s.split_once('@').ok_or_else(|| {
            anyhow::anyhow!("action reference '{}' must be written name@version", s)
        })?;

        let valid = |part: &str| {
            !part.is_empty()
                && part
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/'))
        };

        if !valid(name) || !valid(version) {
            anyhow::bail!("invalid action reference '{}'", s);
        }

        Ok(Self::new(name, version))
    }
}

impl fmt::Display for ActionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// What a step does when it runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepAction {
    /// Invoke a registered action
    Uses(ActionRef),
    /// Run a shell command
    Run(String),
}

/// A single step of a job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub name: String,
    pub action: StepAction,

    /// Action inputs
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub with: BTreeMap<String, String>,

    /// Step-level environment, layered over the job's
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,

    pub state: StepState,
}

impl Step {
    pub fn uses(action: ActionRef) -> Self {
        let name = format!("Run {}", action);
        Self::new(name, StepAction::Uses(action))
    }

    pub fn run(command: impl Into<String>) -> Self {
        let command = command.into();
        let name = default_run_name(&command);
        Self::new(name, StepAction::Run(command))
    }

    fn new(name: String, action: StepAction) -> Self {
        Self {
            name,
            action,
            with: BTreeMap::new(),
            env: BTreeMap::new(),
            state: StepState::Pending,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_input(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.with.insert(key.into(), value.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Convert a validated step config into a domain step
    pub fn from_config(config: &StepConfig) -> Result<Self> {
        let mut step = match (&config.uses, &config.run) {
            (Some(uses), None) => Step::uses(uses.parse()?),
            (None, Some(run)) => Step::run(run.clone()),
            _ => anyhow::bail!("a step needs exactly one of 'uses' or 'run'"),
        };

        if let Some(name) = &config.name {
            step.name = name.clone();
        }
        step.with = config.inputs()?;
        step.env = config.env()?;
        Ok(step)
    }

    pub fn action_ref(&self) -> Option<&ActionRef> {
        match &self.action {
            StepAction::Uses(r) => Some(r),
            StepAction::Run(_) => None,
        }
    }
}

fn default_run_name(command: &str) -> String {
    let first_line = command.lines().next().unwrap_or_default().trim();
    format!("Run {}", first_line)
}
