//! CLI command definitions

use crate::cache::fs::CACHE_DIR_ENV;
use crate::core::trigger::{EventKind, TriggerError, TriggerEvent};
use crate::execution::SchedulingStrategy;
use crate::lint::packages::{BannedDepConfig, BannedDepType};
use crate::lint::{
    BannedDepsConfig, DirectDepDupsConfig, EnforcedAttributesConfig, HygieneConfig,
    PackageLintConfig,
};
use clap::Args;
use std::path::PathBuf;

/// The event a command evaluates
#[derive(Debug, Args, Clone)]
pub struct EventArgs {
    /// Kind of event
    #[arg(long, value_enum, default_value_t = EventKindArg::Push)]
    pub event: EventKindArg,

    /// Pushed branch, or the pull request's source branch
    /// (defaults to the current branch)
    #[arg(short, long)]
    pub branch: Option<String>,

    /// Target branch of a pull request
    #[arg(short, long)]
    pub target: Option<String>,
}

impl EventArgs {
    /// Build the event, using `fallback_branch` when no branch was given
    pub fn to_event(&self, fallback_branch: Option<String>) -> Result<TriggerEvent, TriggerError> {
        let branch = self.branch.clone().or(fallback_branch).unwrap_or_default();
        TriggerEvent::new(self.event.into(), branch, self.target.clone())
    }
}

/// Evaluate the trigger and run the jobs
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Path to workflow YAML file
    #[arg(short, long)]
    pub workflow: Option<PathBuf>,

    #[command(flatten)]
    pub event: EventArgs,

    /// Revision to verify
    #[arg(long, default_value = "HEAD")]
    pub rev: String,

    /// Only run these jobs
    #[arg(long)]
    pub job: Vec<String>,

    /// Environment overrides for every job (key=value)
    #[arg(long, value_parser = parse_key_value)]
    pub env: Vec<(String, String)>,

    /// Scheduling strategy
    #[arg(long, value_enum, default_value_t = SchedulingStrategyArg::Parallel)]
    pub strategy: SchedulingStrategyArg,

    /// Cap on concurrently running jobs under the parallel strategy
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    pub max_jobs: Option<u16>,

    /// Dependency cache directory
    #[arg(long, env = CACHE_DIR_ENV)]
    pub cache_dir: Option<PathBuf>,

    /// Run without the dependency cache
    #[arg(long)]
    pub no_cache: bool,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,
}

impl RunCommand {
    pub fn scheduling_strategy(&self) -> SchedulingStrategy {
        match (self.strategy, self.max_jobs) {
            (SchedulingStrategyArg::Parallel, Some(max)) => {
                SchedulingStrategy::LimitedParallel(usize::from(max))
            }
            (strategy, _) => strategy.into(),
        }
    }
}

/// Show whether an event would start the gate
#[derive(Debug, Args, Clone)]
pub struct CheckTriggerCommand {
    /// Path to workflow YAML file
    #[arg(short, long)]
    pub workflow: Option<PathBuf>,

    #[command(flatten)]
    pub event: EventArgs,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Validate a workflow configuration
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Path to workflow YAML file
    #[arg(short, long)]
    pub workflow: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Run hygiene linters
#[derive(Debug, Args, Clone)]
pub struct LintCommand {
    /// Stop at the first file with an error
    #[arg(long)]
    pub fail_fast: bool,

    /// Header every source file must carry
    #[arg(long)]
    pub license_header: Option<String>,

    /// Glob of files exempt from whitespace checks
    #[arg(long)]
    pub whitespace_exception: Vec<String>,

    /// Skip the cargo package graph lints
    #[arg(long)]
    pub no_package_lints: bool,

    /// Crate allowed at more than one version among direct dependencies
    #[arg(long)]
    pub allow_duplicate_dep: Vec<String>,

    /// License every workspace package must declare
    #[arg(long)]
    pub enforced_license: Option<String>,

    /// Ban a crate anywhere in the graph (name=message)
    #[arg(long, value_parser = parse_key_value)]
    pub ban: Vec<(String, String)>,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

impl LintCommand {
    pub fn to_config(&self) -> HygieneConfig {
        let banned = self
            .ban
            .iter()
            .map(|(name, message)| {
                let config = BannedDepConfig {
                    message: message.clone(),
                    type_: BannedDepType::Always,
                };
                (name.clone(), config)
            })
            .collect();

        HygieneConfig {
            license_header: self.license_header.clone(),
            whitespace_exceptions: self.whitespace_exception.clone(),
            fail_fast: self.fail_fast,
            package_lints: !self.no_package_lints,
            packages: PackageLintConfig {
                direct_dep_dups: DirectDepDupsConfig {
                    allow: self.allow_duplicate_dep.clone(),
                },
                banned_deps: BannedDepsConfig(banned),
                enforced_attributes: EnforcedAttributesConfig {
                    authors: None,
                    license: self.enforced_license.clone(),
                },
            },
        }
    }
}

/// Print the cache key for the current workspace
#[derive(Debug, Args, Clone)]
pub struct CacheKeyCommand {
    /// Toolchain component of the key
    #[arg(long, default_value = "default")]
    pub toolchain: String,

    /// Key prefix
    #[arg(long, default_value = "cargo")]
    pub prefix: String,
}

/// Event kind argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum EventKindArg {
    Push,
    PullRequest,
}

impl From<EventKindArg> for EventKind {
    fn from(arg: EventKindArg) -> Self {
        match arg {
            EventKindArg::Push => EventKind::Push,
            EventKindArg::PullRequest => EventKind::PullRequest,
        }
    }
}

/// Scheduling strategy argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SchedulingStrategyArg {
    Parallel,
    Sequential,
}

impl From<SchedulingStrategyArg> for SchedulingStrategy {
    fn from(arg: SchedulingStrategyArg) -> Self {
        match arg {
            SchedulingStrategyArg::Parallel => SchedulingStrategy::Parallel,
            SchedulingStrategyArg::Sequential => SchedulingStrategy::Sequential,
        }
    }
}

/// Parse key=value pairs
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("Invalid key=value pair: {}", s)),
    }
}
