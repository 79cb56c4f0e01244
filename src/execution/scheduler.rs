//! Job scheduler - runs independent jobs concurrently or one at a time

use crate::core::Job;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::error;

/// Strategy for scheduling job execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchedulingStrategy {
    /// Execute jobs one at a time, in declaration order
    Sequential,

    /// Execute all jobs at once
    #[default]
    Parallel,

    /// Limited parallelism (max N concurrent jobs)
    LimitedParallel(usize),
}

/// Runs a set of jobs under a strategy
///
/// Jobs share nothing through the scheduler: one job's failure never
/// cancels or delays another.
#[derive(Debug, Clone, Copy, Default)]
pub struct JobScheduler {
    strategy: SchedulingStrategy,
}

impl JobScheduler {
    pub fn new(strategy: SchedulingStrategy) -> Self {
        Self { strategy }
    }

    /// Run every job through `run`; results keep the input order
    pub async fn run_all<F, Fut>(&self, jobs: Vec<Job>, run: F) -> Vec<Job>
    where
        F: Fn(Job) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Job> + Send + 'static,
    {
        match self.strategy {
            SchedulingStrategy::Sequential => {
                let mut finished = Vec::with_capacity(jobs.len());
                for job in jobs {
                    finished.push(run(job).await);
                }
                finished
            }
            SchedulingStrategy::Parallel => run_concurrently(jobs, run, None).await,
            SchedulingStrategy::LimitedParallel(max) => {
                run_concurrently(jobs, run, Some(max.max(1))).await
            }
        }
    }
}

async fn run_concurrently<F, Fut>(jobs: Vec<Job>, run: F, limit: Option<usize>) -> Vec<Job>
where
    F: Fn(Job) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Job> + Send + 'static,
{
    let run = Arc::new(run);
    let permits = limit.map(|n| Arc::new(Semaphore::new(n)));
    let originals = jobs.clone();
    let mut set = JoinSet::new();

    for (index, job) in jobs.into_iter().enumerate() {
        let run = run.clone();
        let permits = permits.clone();
        set.spawn(async move {
            let _permit = match permits {
                Some(semaphore) => semaphore.acquire_owned().await.ok(),
                None => None,
            };
            (index, run(job).await)
        });
    }

    let mut slots: Vec<Option<Job>> = (0..originals.len()).map(|_| None).collect();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((index, job)) => slots[index] = Some(job),
            Err(e) => error!("Job task aborted: {}", e),
        }
    }

    slots
        .into_iter()
        .zip(originals)
        .map(|(slot, original)| slot.unwrap_or_else(|| aborted(original)))
        .collect()
}

fn aborted(mut job: Job) -> Job {
    if job.state.start().is_ok() {
        let _ = job.state.fail(None, "job task aborted before completion");
    }
    job
}
