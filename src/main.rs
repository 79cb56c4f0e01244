use anyhow::{Context, Result};
use merge_gate::action::{ActionRegistry, GitCli};
use merge_gate::cache::fs::default_cache_dir;
use merge_gate::cache::{CacheKey, DependencyCache, DisabledCache, FsCache};
use merge_gate::cli::commands::{
    CacheKeyCommand, CheckTriggerCommand, LintCommand, RunCommand, ValidateCommand,
};
use merge_gate::cli::output::*;
use merge_gate::cli::{Cli, Command};
use merge_gate::core::config::{WorkflowConfig, WORKFLOW_FILE_NAME};
use merge_gate::core::{RepoSource, Workflow};
use merge_gate::execution::WorkflowEngine;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    // Execute command
    match &cli.command {
        Command::Run(cmd) => run_gate(cmd).await?,
        Command::CheckTrigger(cmd) => check_trigger(cmd).await?,
        Command::Validate(cmd) => validate_workflow(cmd).await?,
        Command::Lint(cmd) => lint_repository(cmd).await?,
        Command::CacheKey(cmd) => print_cache_key(cmd).await?,
    }

    Ok(())
}

/// The repository containing the current directory, if any
async fn current_repository() -> Result<Option<GitCli>> {
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    match GitCli::discover(&cwd).await {
        Ok(git) => Ok(Some(git)),
        Err(e) => {
            debug!("No repository at {}: {}", cwd.display(), e);
            Ok(None)
        }
    }
}

/// Explicit file, else `.merge-gate.yml` at the repository root, else the built-in gate
fn load_config(
    explicit: Option<&Path>,
    repo_root: Option<&Path>,
) -> Result<(WorkflowConfig, String)> {
    if let Some(path) = explicit {
        let config = WorkflowConfig::from_file(path)?;
        return Ok((config, path.display().to_string()));
    }

    if let Some(root) = repo_root {
        let path = root.join(WORKFLOW_FILE_NAME);
        if path.is_file() {
            let config = WorkflowConfig::from_file(&path)?;
            return Ok((config, path.display().to_string()));
        }
    }

    Ok((WorkflowConfig::default_gate()?, "built-in gate".to_string()))
}

fn load_workflow(explicit: Option<&Path>, repo_root: Option<&Path>) -> Result<Workflow> {
    let (config, origin) = load_config(explicit, repo_root)?;
    debug!("Loaded workflow {} from {}", config.name, origin);
    Workflow::from_config(&config).with_context(|| format!("Invalid workflow in {}", origin))
}

async fn run_gate(cmd: &RunCommand) -> Result<()> {
    let git = current_repository()
        .await?
        .context("merge-gate run must be started inside a git repository")?;

    let workflow = load_workflow(cmd.workflow.as_deref(), Some(git.root()))?;

    let fallback_branch = if cmd.event.branch.is_none() {
        git.current_branch().await.context("Failed to read the current branch")?
    } else {
        None
    };
    let event = cmd.event.to_event(fallback_branch).context("Invalid event")?;

    let revision = git
        .rev_parse(&cmd.rev)
        .await
        .with_context(|| format!("Unknown revision '{}'", cmd.rev))?;
    let source = RepoSource::new(git.root(), revision);

    let cache: Arc<dyn DependencyCache> = if cmd.no_cache {
        Arc::new(DisabledCache)
    } else {
        let dir = cmd.cache_dir.clone().unwrap_or_else(default_cache_dir);
        Arc::new(
            FsCache::new(&dir)
                .with_context(|| format!("Failed to open cache at {}", dir.display()))?,
        )
    };

    let mut engine = WorkflowEngine::new(ActionRegistry::builtin(), cache)
        .with_strategy(cmd.scheduling_strategy())
        .with_env_overrides(cmd.env.iter().cloned().collect());

    if !cmd.json {
        println!(
            "{} {} @ {}",
            INFO,
            style(&workflow.name).bold(),
            style(&source.revision[..source.revision.len().min(12)]).dim()
        );
        let display = ProgressDisplay::new();
        engine.add_event_handler(move |event| display.handle(&event));
    }

    let run = engine.run(&workflow, &event, &source, &cmd.job).await?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&run)?);
    } else {
        println!();
        print!("{}", format_run_summary(&run));
    }

    if run.exit_code() != 0 {
        std::process::exit(run.exit_code());
    }
    Ok(())
}

async fn check_trigger(cmd: &CheckTriggerCommand) -> Result<()> {
    let git = current_repository().await?;
    let root = git.as_ref().map(|g| g.root().to_path_buf());
    let workflow = load_workflow(cmd.workflow.as_deref(), root.as_deref())?;

    let fallback_branch = match (&cmd.event.branch, &git) {
        (None, Some(git)) => git.current_branch().await.unwrap_or_else(|e| {
            warn!("Could not read the current branch: {}", e);
            None
        }),
        _ => None,
    };
    let event = cmd.event.to_event(fallback_branch).context("Invalid event")?;
    let decision = workflow.evaluate(&event);

    if cmd.json {
        let data = serde_json::json!({
            "workflow": workflow.name,
            "event": event,
            "decision": decision,
        });
        println!("{}", serde_json::to_string_pretty(&data)?);
    } else {
        println!("{} {}: {}", INFO, event, format_decision(&decision));
    }
    Ok(())
}

async fn validate_workflow(cmd: &ValidateCommand) -> Result<()> {
    if !cmd.json {
        println!("{} Validating workflow...", INFO);
    }

    let git = current_repository().await?;
    let root: Option<PathBuf> = git.as_ref().map(|g| g.root().to_path_buf());

    let result =
        load_config(cmd.workflow.as_deref(), root.as_deref()).and_then(|(config, origin)| {
            let workflow = Workflow::from_config(&config)?;
            ActionRegistry::builtin().check_workflow(&workflow)?;
            Ok((workflow, origin))
        });

    let (workflow, origin) = match result {
        Ok(valid) => valid,
        Err(e) => {
            if cmd.json {
                let data = serde_json::json!({
                    "valid": false,
                    "error": format!("{:#}", e),
                });
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else {
                println!("{} Validation failed:", CROSS);
                println!("  {}", style(format!("{:#}", e)).red());
            }
            std::process::exit(1);
        }
    };

    if cmd.json {
        let jobs: Vec<_> = workflow
            .jobs()
            .iter()
            .map(|job| {
                serde_json::json!({
                    "id": job.id,
                    "name": job.name,
                    "timeout_minutes": job.timeout_minutes,
                    "steps": job.steps.iter().map(|s| &s.name).collect::<Vec<_>>(),
                })
            })
            .collect();
        let data = serde_json::json!({
            "valid": true,
            "name": workflow.name,
            "source": origin,
            "jobs": jobs,
        });
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }

    println!("{} Workflow configuration is valid!", CHECK);
    println!("  Name: {}", style(&workflow.name).bold());
    println!("  Source: {}", style(&origin).dim());
    for job in workflow.jobs() {
        println!(
            "  Job {}: {} ({} steps, {} min limit)",
            style(&job.id).cyan(),
            job.name,
            job.steps.len(),
            job.timeout_minutes
        );
    }
    Ok(())
}

async fn lint_repository(cmd: &LintCommand) -> Result<()> {
    let git = current_repository()
        .await?
        .context("merge-gate lint must be started inside a git repository")?;

    let engine = cmd.to_config().build_engine(git.root())?;
    let files = git.tracked_files().await?;

    let results = tokio::task::spawn_blocking(move || engine.run(&files))
        .await
        .context("Lint task failed")??;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        print!("{}", format_lint_results(&results));
    }

    if results.has_errors() {
        std::process::exit(1);
    }
    Ok(())
}

async fn print_cache_key(cmd: &CacheKeyCommand) -> Result<()> {
    let root = match current_repository().await? {
        Some(git) => git.root().to_path_buf(),
        None => std::env::current_dir()?,
    };
    let key = CacheKey::compute(&cmd.prefix, &root, &cmd.toolchain)
        .with_context(|| format!("Failed to compute cache key for {}", root.display()))?;
    println!("{}", key);
    Ok(())
}
