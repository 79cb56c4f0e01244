//! Main execution engine - evaluates the trigger and runs the job graph

use crate::action::{ActionError, ActionRegistry};
use crate::cache::{DependencyCache, PutOutcome};
use crate::core::{
    Job, JobContext, RepoSource, TriggerDecision, TriggerEvent, Workflow, WorkflowStatus,
};
use crate::execution::{JobRunner, JobScheduler, SchedulingStrategy};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

/// Events that can occur during a gate run
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    WorkflowStarted {
        run_id: Uuid,
        workflow: String,
        event: String,
        jobs: Vec<String>,
    },
    WorkflowSkipped {
        run_id: Uuid,
        workflow: String,
        reason: String,
    },
    JobStarted {
        job_id: String,
        name: String,
        total_steps: usize,
    },
    StepStarted {
        job_id: String,
        index: usize,
        step: String,
    },
    StepFinished {
        job_id: String,
        index: usize,
        step: String,
        passed: bool,
        error: Option<String>,
    },
    StepSkipped {
        job_id: String,
        index: usize,
        step: String,
        reason: String,
    },
    CacheRestored {
        job_id: String,
        key: String,
        hit: bool,
    },
    CacheSaved {
        job_id: String,
        key: String,
        outcome: PutOutcome,
    },
    JobFinished {
        job_id: String,
        success: bool,
        failed_step: Option<String>,
    },
    WorkflowFinished {
        run_id: Uuid,
        status: WorkflowStatus,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(ExecutionEvent) + Send + Sync>;

/// Fans events out to every registered handler
#[derive(Clone, Default)]
pub struct EventEmitter {
    handlers: Arc<Vec<EventHandler>>,
}

impl EventEmitter {
    pub fn new(handlers: Vec<EventHandler>) -> Self {
        Self {
            handlers: Arc::new(handlers),
        }
    }

    pub fn emit(&self, event: ExecutionEvent) {
        for handler in self.handlers.iter() {
            handler(event.clone());
        }
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("workflow cannot run: {0}")]
    Action(#[from] ActionError),

    #[error("{0}")]
    Selection(String),
}

/// Record of one gate run
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowRun {
    pub run_id: Uuid,
    pub workflow: String,
    pub event: TriggerEvent,
    pub decision: TriggerDecision,
    pub status: WorkflowStatus,
    pub jobs: Vec<Job>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl WorkflowRun {
    pub fn job(&self, id: &str) -> Option<&Job> {
        self.jobs.iter().find(|j| j.id == id)
    }

    /// Process exit status: non-zero only when a job failed
    pub fn exit_code(&self) -> i32 {
        match self.status {
            WorkflowStatus::Failed => 1,
            _ => 0,
        }
    }
}

/// Main gate execution engine
pub struct WorkflowEngine {
    registry: Arc<ActionRegistry>,
    cache: Arc<dyn DependencyCache>,
    strategy: SchedulingStrategy,
    env_overrides: BTreeMap<String, String>,
    event_handlers: Vec<EventHandler>,
}

impl WorkflowEngine {
    pub fn new(registry: ActionRegistry, cache: Arc<dyn DependencyCache>) -> Self {
        Self {
            registry: Arc::new(registry),
            cache,
            strategy: SchedulingStrategy::default(),
            env_overrides: BTreeMap::new(),
            event_handlers: Vec::new(),
        }
    }

    pub fn with_strategy(mut self, strategy: SchedulingStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Variables layered over workflow and job env for every job
    pub fn with_env_overrides(mut self, env: BTreeMap<String, String>) -> Self {
        self.env_overrides = env;
        self
    }

    /// Add an event handler
    pub fn add_event_handler<F>(&mut self, handler: F)
    where
        F: Fn(ExecutionEvent) + Send + Sync + 'static,
    {
        self.event_handlers.push(Arc::new(handler));
    }

    /// Run the workflow for one event
    ///
    /// A rejected event yields a `Skipped` run with no jobs. Otherwise the
    /// selected jobs (all when `selection` is empty) run under the
    /// configured strategy, each in its own context.
    pub async fn run(
        &self,
        workflow: &Workflow,
        event: &TriggerEvent,
        source: &RepoSource,
        selection: &[String],
    ) -> Result<WorkflowRun, EngineError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let emitter = EventEmitter::new(self.event_handlers.clone());

        let decision = workflow.evaluate(event);
        if let TriggerDecision::Skip { reason } = &decision {
            info!("Skipping workflow {} for {}: {}", workflow.name, event, reason);
            emitter.emit(ExecutionEvent::WorkflowSkipped {
                run_id,
                workflow: workflow.name.clone(),
                reason: reason.clone(),
            });
            return Ok(WorkflowRun {
                run_id,
                workflow: workflow.name.clone(),
                event: event.clone(),
                decision,
                status: WorkflowStatus::Skipped,
                jobs: Vec::new(),
                started_at,
                completed_at: Utc::now(),
            });
        }

        self.registry.check_workflow(workflow)?;
        let jobs = workflow
            .instantiate(selection)
            .map_err(|e| EngineError::Selection(e.to_string()))?;

        info!(
            "Starting workflow {} ({}) for {}: {} jobs",
            workflow.name,
            run_id,
            event,
            jobs.len()
        );
        emitter.emit(ExecutionEvent::WorkflowStarted {
            run_id,
            workflow: workflow.name.clone(),
            event: event.to_string(),
            jobs: jobs.iter().map(|j| j.id.clone()).collect(),
        });

        let runner = Arc::new(JobRunner::new(self.registry.clone(), emitter.clone()));
        let base_env = workflow.env.clone();
        let overrides = self.env_overrides.clone();
        let source = source.clone();
        let cache = self.cache.clone();

        let finished = JobScheduler::new(self.strategy)
            .run_all(jobs, move |job| {
                let runner = runner.clone();
                let mut env = base_env.clone();
                env.extend(job.env.clone());
                env.extend(overrides.clone());
                let ctx = JobContext::new(job.id.clone(), source.clone(), env, cache.clone());
                async move { runner.run(job, ctx).await }
            })
            .await;

        let status = if finished.iter().all(Job::is_success) {
            WorkflowStatus::Succeeded
        } else {
            WorkflowStatus::Failed
        };

        match status {
            WorkflowStatus::Succeeded => info!("Workflow {} ({}) succeeded", workflow.name, run_id),
            _ => warn!("Workflow {} ({}) failed", workflow.name, run_id),
        }
        emitter.emit(ExecutionEvent::WorkflowFinished { run_id, status });

        Ok(WorkflowRun {
            run_id,
            workflow: workflow.name.clone(),
            event: event.clone(),
            decision,
            status,
            jobs: finished,
            started_at,
            completed_at: Utc::now(),
        })
    }
}
