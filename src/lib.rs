//! merge-gate - a pre-merge CI gate for Rust repositories
//!
//! A workflow is a trigger filter plus independent jobs; each job is an
//! ordered list of steps that invoke versioned actions and stop at the
//! first failure.

pub mod action;
pub mod cache;
pub mod cli;
pub mod core;
pub mod execution;
pub mod lint;

// Re-export commonly used types
pub use crate::action::{Action, ActionError, ActionOutput, ActionRegistry, Invocation};
pub use crate::cache::{CacheKey, DependencyCache, FsCache};
pub use crate::core::{Job, JobContext, RepoSource, Step, StepState, TriggerEvent, Workflow};
pub use crate::execution::{ExecutionEvent, SchedulingStrategy, WorkflowEngine, WorkflowRun};
