//! Workflow execution: trigger evaluation, job scheduling and step running

pub mod engine;
pub mod executor;
pub mod scheduler;

pub use engine::{
    EngineError, EventEmitter, EventHandler, ExecutionEvent, WorkflowEngine, WorkflowRun,
};
pub use executor::{extract_failing_tests, JobRunner};
pub use scheduler::{JobScheduler, SchedulingStrategy};
