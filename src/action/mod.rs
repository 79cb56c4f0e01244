//! Actions - reusable step implementations
//!
//! Every step is an invocation of an action: a named, versioned capability
//! that takes inputs and the job context and yields an exit status plus a
//! log. `run:` steps go through the shell action registered as `run`.

pub mod checkout;
pub mod command;
pub mod diff_check;
pub mod git;
pub mod hygiene;
pub mod output;
pub mod restore_cache;
pub mod toolchain;

pub use checkout::Checkout;
pub use command::{ShellCommand, RUN_ACTION};
pub use diff_check::DiffCheck;
pub use git::{GitCli, GitError};
pub use hygiene::Hygiene;
pub use output::{ActionError, ActionOutput};
pub use restore_cache::RestoreCache;
pub use toolchain::Toolchain;

use crate::core::{ActionRef, JobContext, StepAction, Workflow};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

/// Version every built-in action provides
pub const DEFAULT_VERSION: &str = "v1";

/// One call of an action on behalf of a step
#[derive(Debug, Clone)]
pub struct Invocation<'a> {
    pub step_name: &'a str,
    pub version: &'a str,
    pub inputs: &'a BTreeMap<String, String>,
    /// Script of a `run:` step
    pub script: Option<&'a str>,
    /// Effective environment for the step
    pub env: BTreeMap<String, String>,
    /// Time left before the job's ceiling
    pub timeout: Duration,
}

impl<'a> Invocation<'a> {
    pub fn new(
        step_name: &'a str,
        version: &'a str,
        inputs: &'a BTreeMap<String, String>,
        timeout: Duration,
    ) -> Self {
        Self {
            step_name,
            version,
            inputs,
            script: None,
            env: BTreeMap::new(),
            timeout,
        }
    }

    pub fn with_script(mut self, script: &'a str) -> Self {
        self.script = Some(script);
        self
    }

    pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
        self.env = env;
        self
    }

    /// A non-blank input value
    pub fn input(&self, key: &str) -> Option<&'a str> {
        self.inputs
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    pub fn require_input(&self, key: &str) -> Result<&'a str, ActionError> {
        self.input(key)
            .ok_or_else(|| ActionError::MissingInput(key.to_string()))
    }

    /// Split a comma- or whitespace-separated input
    pub fn list_input(&self, key: &str) -> Vec<String> {
        self.input(key)
            .map(|v| {
                v.split(|c: char| c == ',' || c.is_whitespace())
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn bool_input(&self, key: &str, default: bool) -> Result<bool, ActionError> {
        match self.input(key) {
            None => Ok(default),
            Some(v) => match v.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Ok(true),
                "false" | "no" | "0" => Ok(false),
                _ => Err(ActionError::InvalidInput {
                    input: key.to_string(),
                    value: v.to_string(),
                }),
            },
        }
    }
}

/// A step capability: `(name, version, inputs) -> exit status + log`
#[async_trait]
pub trait Action: Send + Sync {
    fn name(&self) -> &str;

    fn versions(&self) -> &[&str] {
        &[DEFAULT_VERSION]
    }

    async fn run(
        &self,
        invocation: &Invocation<'_>,
        ctx: &mut JobContext,
    ) -> Result<ActionOutput, ActionError>;
}

/// Actions available to a workflow, by name
#[derive(Clone, Default)]
pub struct ActionRegistry {
    actions: HashMap<String, Arc<dyn Action>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in action
    pub fn builtin() -> Self {
        Self::new()
            .with(Checkout)
            .with(Toolchain::default())
            .with(RestoreCache)
            .with(DiffCheck)
            .with(Hygiene)
            .with(ShellCommand::default())
    }

    /// Add an action, replacing any with the same name
    pub fn register<A: Action + 'static>(&mut self, action: A) {
        self.actions.insert(action.name().to_string(), Arc::new(action));
    }

    pub fn with<A: Action + 'static>(mut self, action: A) -> Self {
        self.register(action);
        self
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.actions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn resolve(&self, action: &ActionRef) -> Result<Arc<dyn Action>, ActionError> {
        let found = self
            .actions
            .get(&action.name)
            .ok_or_else(|| ActionError::UnknownAction(action.name.clone()))?;

        if !found.versions().contains(&action.version.as_str()) {
            return Err(ActionError::UnsupportedVersion {
                name: action.name.clone(),
                version: action.version.clone(),
                available: found.versions().join(", "),
            });
        }
        Ok(found.clone())
    }

    /// The action a step runs
    pub fn resolve_step(&self, action: &StepAction) -> Result<Arc<dyn Action>, ActionError> {
        match action {
            StepAction::Uses(r) => self.resolve(r),
            StepAction::Run(_) => self.resolve(&ActionRef::new(RUN_ACTION, DEFAULT_VERSION)),
        }
    }

    /// Check that every step of the workflow resolves
    pub fn check_workflow(&self, workflow: &Workflow) -> Result<(), ActionError> {
        for job in workflow.jobs() {
            for step in &job.steps {
                self.resolve_step(&step.action)?;
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("actions", &self.names())
            .finish()
    }
}
