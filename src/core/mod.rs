//! Core domain models
//!
//! This module defines the workflow, its jobs and steps, the trigger
//! filter that decides whether a run happens, and their configuration.

pub mod config;
pub mod context;
pub mod job;
pub mod pattern;
pub mod state;
pub mod step;
pub mod trigger;
pub mod workflow;

pub use context::*;
pub use job::*;
pub use state::*;
pub use step::*;
pub use trigger::*;
pub use workflow::*;
