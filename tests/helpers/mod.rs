//! Test utilities for merge-gate scenarios
//!
//! The gate's real steps shell out to git, rustup and cargo. Scenarios swap
//! those actions for scripted stand-ins so each property can be driven
//! deterministically.

#![allow(dead_code)]

use async_trait::async_trait;
use merge_gate::action::restore_cache::job_prefix;
use merge_gate::action::{Action, ActionError, ActionOutput, ActionRegistry, Invocation};
use merge_gate::cache::{CacheKey, DependencyCache, DisabledCache};
use merge_gate::core::{
    Job, JobContext, JobState, RepoSource, Step, StepState, TriggerEvent, Workflow,
};
use merge_gate::execution::{ExecutionEvent, WorkflowEngine, WorkflowRun};
use std::path::Path;
use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const CARGO_TOML: &str =
    "[package]\nname = \"sample\"\nversion = \"0.1.0\"\nedition = \"2021\"\n";
pub const CARGO_LOCK: &str = "version = 3\n\n[[package]]\nname = \"sample\"\nversion = \"0.1.0\"\n";

/// One command the scripted shell was asked to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCall {
    pub job_id: String,
    pub script: String,
}

/// Stand-in for the `run` action
///
/// Scripts pass unless they contain a registered pattern, in which case the
/// registered exit code and log are returned. Every `cargo` command leaves a
/// build artifact under `target/` as a real build would.
#[derive(Clone, Default)]
pub struct ScriptedShell {
    rules: Arc<Vec<(String, i32, String)>>,
    calls: Arc<Mutex<Vec<ShellCall>>>,
    delay: Option<Duration>,
}

impl ScriptedShell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts containing `pattern` exit with `code` and print `log`
    pub fn fails(mut self, pattern: &str, code: i32, log: &str) -> Self {
        Arc::make_mut(&mut self.rules).push((pattern.to_string(), code, log.to_string()));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<ShellCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn scripts_for(&self, job_id: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.job_id == job_id)
            .map(|c| c.script)
            .collect()
    }
}

#[async_trait]
impl Action for ScriptedShell {
    fn name(&self) -> &str {
        "run"
    }

    async fn run(
        &self,
        invocation: &Invocation<'_>,
        ctx: &mut JobContext,
    ) -> Result<ActionOutput, ActionError> {
        let script = invocation.script.unwrap_or_default().to_string();
        self.calls.lock().unwrap().push(ShellCall {
            job_id: ctx.job_id.clone(),
            script: script.clone(),
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if script.starts_with("cargo") {
            if let Some(ws) = ctx.workspace() {
                let target = ws.join("target/debug");
                std::fs::create_dir_all(&target)?;
                std::fs::write(target.join("sample.d"), format!("built by {}\n", ctx.job_id))?;
            }
        }

        for (pattern, code, log) in self.rules.iter() {
            if script.contains(pattern.as_str()) {
                return Ok(ActionOutput::failure(*code, log.clone()));
            }
        }
        Ok(ActionOutput::success(format!("$ {}\nok\n", script)))
    }
}

/// Stand-in for `checkout`: a fresh directory holding a minimal crate
#[derive(Clone, Default)]
pub struct FakeCheckout {
    init_git: bool,
    checkouts: Arc<AtomicUsize>,
}

impl FakeCheckout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make each workspace a committed git repository
    pub fn with_git(mut self) -> Self {
        self.init_git = true;
        self
    }

    pub fn checkouts(&self) -> usize {
        self.checkouts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Action for FakeCheckout {
    fn name(&self) -> &str {
        "checkout"
    }

    async fn run(
        &self,
        _invocation: &Invocation<'_>,
        ctx: &mut JobContext,
    ) -> Result<ActionOutput, ActionError> {
        let dir = tempfile::Builder::new()
            .prefix(&format!("fake-checkout-{}-", ctx.job_id))
            .tempdir()?;
        let ws = dir.path().join("src");
        write_crate(&ws);
        if self.init_git {
            init_git_repo(&ws);
        }

        self.checkouts.fetch_add(1, Ordering::SeqCst);
        let log = format!("Checked out into {}\n", ws.display());
        ctx.set_checkout(dir, ws);
        Ok(ActionOutput::success(log))
    }
}

/// An action that always returns the same result
#[derive(Clone)]
pub struct StaticAction {
    name: &'static str,
    exit_code: i32,
    log: String,
    calls: Arc<AtomicUsize>,
}

impl StaticAction {
    pub fn passing(name: &'static str) -> Self {
        Self {
            name,
            exit_code: 0,
            log: format!("{} ok\n", name),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing(name: &'static str, exit_code: i32, log: &str) -> Self {
        Self {
            name,
            exit_code,
            log: log.to_string(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Action for StaticAction {
    fn name(&self) -> &str {
        self.name
    }

    async fn run(
        &self,
        _invocation: &Invocation<'_>,
        _ctx: &mut JobContext,
    ) -> Result<ActionOutput, ActionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ActionOutput::new(self.exit_code, self.log.clone()))
    }
}

/// Built-in registry with checkout, toolchain, diff-check and the shell
/// replaced; the real `cache` action stays in place
pub fn gate_registry(shell: &ScriptedShell) -> ActionRegistry {
    ActionRegistry::builtin()
        .with(FakeCheckout::new())
        .with(StaticAction::passing("toolchain"))
        .with(StaticAction::passing("diff-check"))
        .with(shell.clone())
}

pub fn write_crate(dir: &Path) {
    std::fs::create_dir_all(dir.join("src")).unwrap();
    std::fs::write(dir.join("Cargo.toml"), CARGO_TOML).unwrap();
    std::fs::write(dir.join("Cargo.lock"), CARGO_LOCK).unwrap();
    std::fs::write(dir.join("src/lib.rs"), "pub fn answer() -> u32 {\n    42\n}\n").unwrap();
    std::fs::write(dir.join(".gitignore"), "/target\n").unwrap();
}

pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

pub fn git(dir: &Path, args: &[&str]) {
    let status = Command::new("git")
        .args(["-c", "user.name=Gate Test", "-c", "user.email=gate@example.com"])
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap();
    assert!(status.status.success(), "git {:?} failed: {:?}", args, status);
}

pub fn init_git_repo(dir: &Path) {
    git(dir, &["init", "-q"]);
    git(dir, &["add", "-A"]);
    git(dir, &["commit", "-q", "-m", "initial"]);
}

/// The key a job computes for the fake crate when no toolchain is pinned
pub fn expected_cache_key(job_id: &str) -> CacheKey {
    let dir = tempfile::tempdir().unwrap();
    write_crate(dir.path());
    CacheKey::compute(&job_prefix(job_id), dir.path(), "default").unwrap()
}

/// Events received by an engine handler
#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<ExecutionEvent>>>);

impl EventLog {
    pub fn attach(engine: &mut WorkflowEngine) -> Self {
        let log = Self::default();
        let sink = log.0.clone();
        engine.add_event_handler(move |event| sink.lock().unwrap().push(event));
        log
    }

    pub fn events(&self) -> Vec<ExecutionEvent> {
        self.0.lock().unwrap().clone()
    }

    /// `(key, hit)` for every cache lookup of `job_id`
    pub fn cache_lookups(&self, job_id: &str) -> Vec<(String, bool)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ExecutionEvent::CacheRestored { job_id: j, key, hit } if j == job_id => {
                    Some((key, hit))
                }
                _ => None,
            })
            .collect()
    }
}

pub fn engine(registry: ActionRegistry) -> WorkflowEngine {
    engine_with_cache(registry, Arc::new(DisabledCache))
}

pub fn engine_with_cache(
    registry: ActionRegistry,
    cache: Arc<dyn DependencyCache>,
) -> WorkflowEngine {
    WorkflowEngine::new(registry, cache)
}

/// Run a workflow against a placeholder source; the fake checkout ignores it
pub async fn run_workflow(
    engine: &WorkflowEngine,
    workflow: &Workflow,
    event: TriggerEvent,
) -> WorkflowRun {
    engine
        .run(workflow, &event, &RepoSource::new(".", "HEAD"), &[])
        .await
        .unwrap()
}

pub fn push(branch: &str) -> TriggerEvent {
    TriggerEvent::push(branch).unwrap()
}

pub fn pull_request(source: &str, target: &str) -> TriggerEvent {
    TriggerEvent::pull_request(source, target).unwrap()
}

pub fn job<'a>(run: &'a WorkflowRun, id: &str) -> &'a Job {
    run.job(id)
        .unwrap_or_else(|| panic!("job '{}' not in run; jobs: {:?}", id, job_ids(run)))
}

pub fn job_ids(run: &WorkflowRun) -> Vec<&str> {
    run.jobs.iter().map(|j| j.id.as_str()).collect()
}

pub fn step<'a>(run: &'a WorkflowRun, job_id: &str, name: &str) -> &'a Step {
    job(run, job_id)
        .steps
        .iter()
        .find(|s| s.name == name)
        .unwrap_or_else(|| panic!("step '{}' not in job '{}'", name, job_id))
}

pub fn assert_job_succeeded(run: &WorkflowRun, job_id: &str) {
    let job = job(run, job_id);
    assert!(
        job.is_success(),
        "expected job '{}' to succeed, got {:?}",
        job_id,
        job.state
    );
    assert!(job.steps.iter().all(|s| s.state.is_passed()));
}

/// The job failed at `step_name`, and every later step was skipped
pub fn assert_job_failed_at(run: &WorkflowRun, job_id: &str, step_name: &str) {
    let job = job(run, job_id);
    match &job.state {
        JobState::Failed { failed_step, .. } => {
            assert_eq!(failed_step.as_deref(), Some(step_name), "job '{}'", job_id)
        }
        other => panic!("expected job '{}' to fail, got {:?}", job_id, other),
    }

    let index = job
        .steps
        .iter()
        .position(|s| s.name == step_name)
        .unwrap_or_else(|| panic!("step '{}' not in job '{}'", step_name, job_id));

    assert!(job.steps[..index].iter().all(|s| s.state.is_passed()));
    assert!(job.steps[index].state.is_failed());
    for later in &job.steps[index + 1..] {
        assert!(
            matches!(later.state, StepState::Skipped { .. }),
            "step '{}' should be skipped, got {:?}",
            later.name,
            later.state
        );
    }
}

pub fn failing_tests<'a>(run: &'a WorkflowRun, job_id: &str, step_name: &str) -> &'a [String] {
    match &step(run, job_id, step_name).state {
        StepState::Failed { failing_tests, .. } => failing_tests,
        other => panic!("step '{}' did not fail: {:?}", step_name, other),
    }
}
