//! Job runner - executes a job's steps in order, stopping at the first failure

use crate::action::{ActionRegistry, Invocation, DEFAULT_VERSION};
use crate::core::{Job, JobContext, Step, StepAction, StepState};
use crate::execution::{EventEmitter, ExecutionEvent};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::time::{timeout, Duration, Instant};
use tracing::{debug, error, info, warn};

/// Runs one job to a terminal state
pub struct JobRunner {
    registry: Arc<ActionRegistry>,
    events: EventEmitter,
}

impl JobRunner {
    pub fn new(registry: Arc<ActionRegistry>, events: EventEmitter) -> Self {
        Self { registry, events }
    }

    /// Execute the job's steps sequentially
    ///
    /// The first failing step fails the job; every later step is marked
    /// skipped and never invoked. Cache entries scheduled during the job
    /// are stored only if every step passed.
    pub async fn run(&self, mut job: Job, mut ctx: JobContext) -> Job {
        if let Err(e) = job.state.start() {
            warn!("Job {} cannot start: {}", job.id, e);
            return job;
        }

        info!("Starting job {} ({} steps)", job.id, job.steps.len());
        self.events.emit(ExecutionEvent::JobStarted {
            job_id: job.id.clone(),
            name: job.name.clone(),
            total_steps: job.steps.len(),
        });

        let deadline = Instant::now() + job.timeout();
        let mut failure: Option<(String, String)> = None;

        for index in 0..job.steps.len() {
            let step_name = job.steps[index].name.clone();

            if let Some((failed_step, _)) = &failure {
                let reason = format!("skipped because '{}' failed", failed_step);
                debug!("Job {}: {}", job.id, reason);
                self.events.emit(ExecutionEvent::StepSkipped {
                    job_id: job.id.clone(),
                    index,
                    step: step_name,
                    reason: reason.clone(),
                });
                job.steps[index].state = StepState::Skipped { reason };
                continue;
            }

            info!("Job {}: running step '{}'", job.id, step_name);
            self.events.emit(ExecutionEvent::StepStarted {
                job_id: job.id.clone(),
                index,
                step: step_name.clone(),
            });

            let started_at = Utc::now();
            job.steps[index].state = StepState::Running { started_at };

            let remaining = deadline.saturating_duration_since(Instant::now());
            let state = if remaining.is_zero() {
                time_limit_exceeded(job.timeout_minutes, started_at)
            } else {
                self.execute_step(&job.steps[index], &mut ctx, remaining, job.timeout_minutes)
                    .await
            };

            for lookup in ctx.take_cache_lookups() {
                self.events.emit(ExecutionEvent::CacheRestored {
                    job_id: job.id.clone(),
                    key: lookup.key.to_string(),
                    hit: lookup.hit,
                });
            }

            let step_error = match &state {
                StepState::Failed { error, .. } => {
                    error!("Job {}: step '{}' failed: {}", job.id, step_name, error);
                    failure = Some((step_name.clone(), error.clone()));
                    Some(error.clone())
                }
                _ => {
                    info!("Job {}: step '{}' passed", job.id, step_name);
                    None
                }
            };

            self.events.emit(ExecutionEvent::StepFinished {
                job_id: job.id.clone(),
                index,
                step: step_name,
                passed: step_error.is_none(),
                error: step_error,
            });
            job.steps[index].state = state;
        }

        let transition = match &failure {
            None => {
                self.save_caches(&job.id, &mut ctx).await;
                job.state.succeed()
            }
            Some((step, error)) => job.state.fail(Some(step.clone()), error.clone()),
        };
        if let Err(e) = transition {
            warn!("Job {}: {}", job.id, e);
        }

        info!("Job {} finished: {}", job.id, job.state.label());
        self.events.emit(ExecutionEvent::JobFinished {
            job_id: job.id.clone(),
            success: job.is_success(),
            failed_step: failure.map(|(step, _)| step),
        });

        // Dropping the context removes the job's checkout
        drop(ctx);
        job
    }

    async fn execute_step(
        &self,
        step: &Step,
        ctx: &mut JobContext,
        remaining: Duration,
        timeout_minutes: u64,
    ) -> StepState {
        let started_at = Utc::now();

        let action = match self.registry.resolve_step(&step.action) {
            Ok(action) => action,
            Err(e) => return failed(e.to_string(), None, String::new(), started_at),
        };

        let (version, script) = match &step.action {
            StepAction::Uses(r) => (r.version.as_str(), None),
            StepAction::Run(command) => (DEFAULT_VERSION, Some(command.as_str())),
        };

        let mut invocation = Invocation::new(&step.name, version, &step.with, remaining)
            .with_env(ctx.step_env(step));
        if let Some(script) = script {
            invocation = invocation.with_script(script);
        }

        match timeout(remaining, action.run(&invocation, ctx)).await {
            Ok(Ok(output)) if output.passed() => StepState::Passed {
                output: output.log,
                started_at,
                completed_at: Utc::now(),
            },
            Ok(Ok(output)) => {
                let mut state = failed(
                    format!("exited with code {}", output.exit_code),
                    Some(output.exit_code),
                    output.log,
                    started_at,
                );
                if let StepState::Failed {
                    failing_tests,
                    output,
                    ..
                } = &mut state
                {
                    *failing_tests = extract_failing_tests(output);
                }
                state
            }
            Ok(Err(e)) => failed(e.to_string(), None, String::new(), started_at),
            Err(_) => time_limit_exceeded(timeout_minutes, started_at),
        }
    }

    async fn save_caches(&self, job_id: &str, ctx: &mut JobContext) {
        let pending = ctx.take_pending_cache_saves();
        let workspace = match ctx.workspace() {
            Some(ws) => ws.to_path_buf(),
            None => return,
        };

        for save in pending {
            match ctx.cache.put(&save.key, &workspace, &save.paths).await {
                Ok(outcome) => {
                    info!("Job {}: cache {} -> {:?}", job_id, save.key, outcome);
                    self.events.emit(ExecutionEvent::CacheSaved {
                        job_id: job_id.to_string(),
                        key: save.key.to_string(),
                        outcome,
                    });
                }
                Err(e) => warn!("Job {}: failed to save cache {}: {}", job_id, save.key, e),
            }
        }
    }
}

fn failed(
    error: String,
    exit_code: Option<i32>,
    output: String,
    started_at: DateTime<Utc>,
) -> StepState {
    StepState::Failed {
        error,
        exit_code,
        output,
        failing_tests: Vec::new(),
        started_at,
        failed_at: Utc::now(),
    }
}

fn time_limit_exceeded(timeout_minutes: u64, started_at: DateTime<Utc>) -> StepState {
    failed(
        format!("job exceeded its {}-minute time limit", timeout_minutes),
        None,
        String::new(),
        started_at,
    )
}

/// Names of tests reported as `test <name> ... FAILED` in a test log
pub fn extract_failing_tests(log: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for line in log.lines() {
        let name = line
            .trim_end()
            .strip_prefix("test ")
            .and_then(|rest| rest.strip_suffix(" ... FAILED"));
        if let Some(name) = name {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
    }
    names
}
