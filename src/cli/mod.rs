//! Command-line interface

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use commands::{CacheKeyCommand, CheckTriggerCommand, LintCommand, RunCommand, ValidateCommand};
use std::ffi::OsString;

/// Pre-merge gate for Rust repositories
#[derive(Debug, Parser, Clone)]
#[command(name = "merge-gate")]
#[command(version)]
#[command(about = "Run the lint and build-and-test gate for a Rust repository", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Evaluate the trigger and run the gate's jobs
    Run(RunCommand),

    /// Show whether an event would start the gate
    CheckTrigger(CheckTriggerCommand),

    /// Validate a workflow file
    Validate(ValidateCommand),

    /// Run repository hygiene linters on the current repository
    Lint(LintCommand),

    /// Print the dependency cache key for the current workspace
    CacheKey(CacheKeyCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}
