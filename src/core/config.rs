//! Workflow configuration from YAML

use crate::core::step::ActionRef;
use crate::core::trigger::{BranchFilter, TriggerFilter};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// File name looked up at the repository root when no workflow is given
pub const WORKFLOW_FILE_NAME: &str = ".merge-gate.yml";

/// Hard ceiling for a job when the workflow does not set one
pub const DEFAULT_TIMEOUT_MINUTES: u64 = 360;

/// The built-in pre-merge gate: a lint job and a build-and-test job
pub const DEFAULT_WORKFLOW: &str = r#"
name: CI

on:
  push:
    branches: [main, auto, canary]
  pull_request:
    branches: [main]

jobs:
  lint:
    name: Lint
    env:
      RUSTFLAGS: "-D warnings"
    steps:
      - uses: checkout@v1
      - uses: toolchain@v1
        with:
          toolchain: "1.75.0"
          components: clippy, rustfmt
      - uses: cache@v1
      - name: Lint (clippy)
        run: cargo clippy --all-features --all-targets -- -D warnings
      - name: Lint (rustfmt)
        run: cargo fmt --all -- --check
      - name: Check for diffs
        uses: diff-check@v1

  build:
    name: Build and test
    env:
      RUSTFLAGS: "-D warnings"
    steps:
      - uses: checkout@v1
      - uses: toolchain@v1
        with:
          toolchain: "1.75.0"
      - uses: cache@v1
      - name: Run tests
        run: cargo test --all-features
"#;

/// Top-level workflow configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Workflow name
    pub name: String,

    /// Events that start the workflow
    #[serde(rename = "on", default)]
    pub triggers: TriggerConfig,

    /// Environment shared by every job
    #[serde(default)]
    env: BTreeMap<String, Value>,

    /// Jobs keyed by id, in declaration order
    jobs: Mapping,
}

/// The `on:` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriggerConfig {
    #[serde(default)]
    pub push: Option<BranchFilterConfig>,

    #[serde(default)]
    pub pull_request: Option<BranchFilterConfig>,
}

/// Branch list for one event kind; omitted means every branch
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BranchFilterConfig {
    #[serde(default)]
    pub branches: Option<Vec<String>>,
}

/// Job configuration as defined in YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Display name (defaults to the job id)
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    env: BTreeMap<String, Value>,

    /// Wall-clock ceiling for the whole job
    #[serde(
        default = "default_timeout_minutes",
        alias = "timeout-minutes"
    )]
    pub timeout_minutes: u64,

    pub steps: Vec<StepConfig>,
}

/// Step configuration as defined in YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepConfig {
    #[serde(default)]
    pub name: Option<String>,

    /// Action reference, `name@version`
    #[serde(default)]
    pub uses: Option<String>,

    /// Shell command
    #[serde(default)]
    pub run: Option<String>,

    /// Action inputs
    #[serde(default)]
    with: BTreeMap<String, Value>,

    #[serde(default)]
    env: BTreeMap<String, Value>,
}

fn default_timeout_minutes() -> u64 {
    DEFAULT_TIMEOUT_MINUTES
}

impl WorkflowConfig {
    /// Load workflow configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read workflow file {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("invalid workflow file {}", path.display()))
    }

    /// Parse workflow configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: WorkflowConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// The built-in gate workflow
    pub fn default_gate() -> Result<Self> {
        Self::from_yaml(DEFAULT_WORKFLOW)
    }

    /// Validate the workflow configuration
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            anyhow::bail!("Workflow name must not be empty");
        }

        self.trigger_filter()?;
        self.env()?;

        let jobs = self.jobs()?;
        if jobs.is_empty() {
            anyhow::bail!("Workflow '{}' defines no jobs", self.name);
        }

        for (id, job) in &jobs {
            job.validate(id)?;
        }

        Ok(())
    }

    /// Jobs in declaration order
    pub fn jobs(&self) -> Result<Vec<(String, JobConfig)>> {
        let mut seen = HashSet::new();
        let mut jobs = Vec::with_capacity(self.jobs.len());

        for (key, value) in &self.jobs {
            let id = match key {
                Value::String(s) if !s.trim().is_empty() => s.clone(),
                other => anyhow::bail!("Job ids must be non-empty strings, got {:?}", other),
            };
            if !seen.insert(id.clone()) {
                anyhow::bail!("Duplicate job id: {}", id);
            }

            let job: JobConfig = serde_yaml::from_value(value.clone())
                .with_context(|| format!("invalid definition for job '{}'", id))?;
            jobs.push((id, job));
        }

        Ok(jobs)
    }

    /// Workflow-level environment as strings
    pub fn env(&self) -> Result<BTreeMap<String, String>> {
        scalar_map(&self.env, "env")
    }

    /// Build the trigger filter from the `on:` section
    pub fn trigger_filter(&self) -> Result<TriggerFilter> {
        let mut filter = TriggerFilter::new();
        if let Some(push) = &self.triggers.push {
            filter = filter.with_push(push.to_filter()?);
        }
        if let Some(pr) = &self.triggers.pull_request {
            filter = filter.with_pull_request(pr.to_filter()?);
        }
        Ok(filter)
    }
}

impl BranchFilterConfig {
    fn to_filter(&self) -> Result<BranchFilter> {
        match &self.branches {
            None => Ok(BranchFilter::Any),
            Some(branches) => Ok(BranchFilter::only(branches)?),
        }
    }
}

impl JobConfig {
    fn validate(&self, id: &str) -> Result<()> {
        if self.steps.is_empty() {
            anyhow::bail!("Job '{}' has no steps", id);
        }
        if self.timeout_minutes == 0 {
            anyhow::bail!("Job '{}' timeout_minutes must be greater than zero", id);
        }
        self.env().with_context(|| format!("job '{}'", id))?;

        for (index, step) in self.steps.iter().enumerate() {
            step.validate()
                .with_context(|| format!("job '{}' step {}", id, index + 1))?;
        }
        Ok(())
    }

    pub fn env(&self) -> Result<BTreeMap<String, String>> {
        scalar_map(&self.env, "env")
    }
}

impl StepConfig {
    fn validate(&self) -> Result<()> {
        match (&self.uses, &self.run) {
            (Some(_), Some(_)) => anyhow::bail!("a step cannot have both 'uses' and 'run'"),
            (None, None) => anyhow::bail!("a step needs either 'uses' or 'run'"),
            (Some(uses), None) => {
                uses.parse::<ActionRef>()?;
            }
            (None, Some(run)) => {
                if run.trim().is_empty() {
                    anyhow::bail!("'run' command must not be empty");
                }
                if !self.with.is_empty() {
                    anyhow::bail!("'with' is only valid together with 'uses'");
                }
            }
        }
        self.inputs()?;
        self.env()?;
        Ok(())
    }

    pub fn inputs(&self) -> Result<BTreeMap<String, String>> {
        scalar_map(&self.with, "with")
    }

    pub fn env(&self) -> Result<BTreeMap<String, String>> {
        scalar_map(&self.env, "env")
    }
}

/// Stringify a map of scalar YAML values
///
/// Floats are refused: YAML reads an unquoted `1.70` as the number 1.7.
fn scalar_map(map: &BTreeMap<String, Value>, section: &str) -> Result<BTreeMap<String, String>> {
    map.iter()
        .map(|(key, value)| {
            let rendered = match value {
                Value::String(s) => s.clone(),
                Value::Bool(b) => b.to_string(),
                Value::Number(n) if n.is_f64() => anyhow::bail!(
                    "{} '{}' is the number {}; quote it to keep it as written (\"{}\")",
                    section,
                    key,
                    n,
                    n
                ),
                Value::Number(n) => n.to_string(),
                Value::Null => String::new(),
                _ => anyhow::bail!("{} '{}' must be a scalar value", section, key),
            };
            Ok((key.clone(), rendered))
        })
        .collect()
}
