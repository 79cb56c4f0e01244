//! CLI output formatting

use crate::core::{Job, JobState, StepState, TriggerDecision, WorkflowStatus};
use crate::execution::{ExecutionEvent, WorkflowRun};
use crate::lint::LintResults;
use console::Emoji;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "!");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");
pub static SKIP: Emoji<'_, '_> = Emoji("⏭️  ", "- ");

/// Lines of a failed step's log shown in the summary
pub const FAILURE_TAIL_LINES: usize = 20;

/// Format a job state for display
pub fn format_job_state(state: &JobState) -> String {
    match state {
        JobState::Pending => style("PENDING").dim().to_string(),
        JobState::Running { .. } => style("RUNNING").yellow().to_string(),
        JobState::Succeeded { .. } => style("SUCCEEDED").green().to_string(),
        JobState::Failed { .. } => style("FAILED").red().to_string(),
    }
}

/// Format a step state for display
pub fn format_step_state(state: &StepState) -> String {
    match state {
        StepState::Pending => style("PENDING").dim().to_string(),
        StepState::Running { .. } => style("RUNNING").yellow().to_string(),
        StepState::Passed { .. } => style("PASSED").green().to_string(),
        StepState::Failed { .. } => style("FAILED").red().to_string(),
        StepState::Skipped { .. } => style("SKIPPED").dim().to_string(),
    }
}

/// Format a workflow status for display
pub fn format_status(status: WorkflowStatus) -> String {
    match status {
        WorkflowStatus::Succeeded => style("SUCCEEDED").green().to_string(),
        WorkflowStatus::Failed => style("FAILED").red().to_string(),
        WorkflowStatus::Skipped => style("SKIPPED").dim().to_string(),
    }
}

/// Format a trigger decision for display
pub fn format_decision(decision: &TriggerDecision) -> String {
    match decision {
        TriggerDecision::Run => format!("{} {}", ROCKET, style("run").green().bold()),
        TriggerDecision::Skip { reason } => {
            format!("{} {} ({})", SKIP, style("skip").yellow().bold(), reason)
        }
    }
}

/// Format an execution event for display
pub fn format_event(event: &ExecutionEvent) -> String {
    match event {
        ExecutionEvent::WorkflowStarted {
            run_id,
            workflow,
            event,
            jobs,
        } => format!(
            "{} Starting {} for {} ({}): {}",
            ROCKET,
            style(workflow).bold(),
            event,
            style(&run_id.to_string()[..8]).dim(),
            jobs.join(", ")
        ),
        ExecutionEvent::WorkflowSkipped {
            workflow, reason, ..
        } => format!("{} {} skipped: {}", SKIP, style(workflow).bold(), reason),
        ExecutionEvent::JobStarted {
            job_id,
            name,
            total_steps,
        } => format!(
            "{} [{}] {} ({} steps)",
            SPINNER,
            style(job_id).cyan(),
            name,
            total_steps
        ),
        ExecutionEvent::StepStarted { job_id, step, .. } => {
            format!("{} [{}] {}", SPINNER, style(job_id).cyan(), step)
        }
        ExecutionEvent::StepFinished {
            job_id,
            step,
            passed: true,
            ..
        } => format!("{} [{}] {}", CHECK, style(job_id).cyan(), style(step).green()),
        ExecutionEvent::StepFinished {
            job_id,
            step,
            error,
            ..
        } => format!(
            "{} [{}] {}: {}",
            CROSS,
            style(job_id).cyan(),
            style(step).red(),
            style(error.as_deref().unwrap_or("failed")).dim()
        ),
        ExecutionEvent::StepSkipped {
            job_id,
            step,
            reason,
            ..
        } => format!(
            "{} [{}] {} ({})",
            SKIP,
            style(job_id).cyan(),
            style(step).dim(),
            reason
        ),
        ExecutionEvent::CacheRestored { job_id, key, hit } => {
            let verdict = if *hit {
                style("hit").green()
            } else {
                style("miss").yellow()
            };
            format!(
                "{} [{}] cache {} for {}",
                INFO,
                style(job_id).cyan(),
                verdict,
                style(key).dim()
            )
        }
        ExecutionEvent::CacheSaved {
            job_id,
            key,
            outcome,
        } => format!(
            "{} [{}] cache {:?} for {}",
            INFO,
            style(job_id).cyan(),
            outcome,
            style(key).dim()
        ),
        ExecutionEvent::JobFinished {
            job_id,
            success: true,
            ..
        } => format!("{} [{}] {}", CHECK, style(job_id).cyan(), style("succeeded").green()),
        ExecutionEvent::JobFinished {
            job_id,
            failed_step,
            ..
        } => format!(
            "{} [{}] {} at {}",
            CROSS,
            style(job_id).cyan(),
            style("failed").red(),
            failed_step.as_deref().unwrap_or("startup")
        ),
        ExecutionEvent::WorkflowFinished { run_id, status } => format!(
            "{} Run {} {}",
            INFO,
            style(&run_id.to_string()[..8]).dim(),
            format_status(*status)
        ),
    }
}

/// Last `max_lines` lines of a log
pub fn format_output_tail(output: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = output.lines().collect();

    if lines.len() <= max_lines {
        output.trim_end().to_string()
    } else {
        format!(
            "{}... ({} earlier lines)\n{}",
            style("[truncated]").dim(),
            lines.len() - max_lines,
            lines[lines.len() - max_lines..].join("\n")
        )
    }
}

fn format_job_summary(job: &Job) -> String {
    let mut out = format!(
        "  {} {} ({})\n",
        if job.is_success() { CHECK } else { CROSS },
        style(&job.name).bold(),
        format_job_state(&job.state)
    );

    for step in &job.steps {
        out.push_str(&format!("      {} {}\n", format_step_state(&step.state), step.name));

        if let StepState::Failed {
            error,
            output,
            failing_tests,
            ..
        } = &step.state
        {
            out.push_str(&format!("        {}\n", style(error).red()));
            for test in failing_tests {
                out.push_str(&format!("        failing test: {}\n", style(test).red().bold()));
            }
            if !output.trim().is_empty() {
                for line in format_output_tail(output, FAILURE_TAIL_LINES).lines() {
                    out.push_str(&format!("        | {}\n", line));
                }
            }
        }
    }
    out
}

/// Format the final report of a run
pub fn format_run_summary(run: &WorkflowRun) -> String {
    let mut out = format!(
        "{} {} for {}: {}\n",
        INFO,
        style(&run.workflow).bold(),
        run.event,
        format_status(run.status)
    );

    if let TriggerDecision::Skip { reason } = &run.decision {
        out.push_str(&format!("  {}\n", reason));
        return out;
    }

    for job in &run.jobs {
        out.push_str(&format_job_summary(job));
    }

    if let Ok(elapsed) = (run.completed_at - run.started_at).to_std() {
        out.push_str(&format!("  finished in {}\n", format_duration(elapsed)));
    }
    out
}

/// Format lint results for display
pub fn format_lint_results(results: &LintResults) -> String {
    let mut out = results.render();
    let checked = if results.packages_checked > 0 {
        format!(
            "{} packages and {} files",
            results.packages_checked, results.files_checked
        )
    } else {
        format!("{} files", results.files_checked)
    };
    if results.has_errors() {
        out.push_str(&format!(
            "{} {} errors in {}\n",
            CROSS,
            style(results.error_count()).red(),
            checked
        ));
    } else {
        out.push_str(&format!("{} {} checked, no lint errors\n", CHECK, checked));
    }
    out
}

pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

/// Live per-job spinners driven by execution events
pub struct ProgressDisplay {
    multi: MultiProgress,
    bars: Mutex<HashMap<String, ProgressBar>>,
}

impl ProgressDisplay {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            bars: Mutex::new(HashMap::new()),
        }
    }

    fn job_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {prefix:.cyan} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    pub fn handle(&self, event: &ExecutionEvent) {
        let Ok(mut bars) = self.bars.lock() else {
            return;
        };

        match event {
            ExecutionEvent::JobStarted {
                job_id,
                total_steps,
                ..
            } => {
                let bar = self.multi.add(ProgressBar::new(*total_steps as u64));
                bar.set_style(Self::job_style());
                bar.set_prefix(job_id.clone());
                bar.enable_steady_tick(Duration::from_millis(100));
                bars.insert(job_id.clone(), bar);
            }
            ExecutionEvent::StepStarted { job_id, step, .. } => {
                if let Some(bar) = bars.get(job_id) {
                    bar.set_message(step.clone());
                }
            }
            ExecutionEvent::StepFinished { job_id, .. }
            | ExecutionEvent::StepSkipped { job_id, .. } => {
                if let Some(bar) = bars.get(job_id) {
                    bar.inc(1);
                }
            }
            ExecutionEvent::JobFinished { job_id, .. } => {
                if let Some(bar) = bars.remove(job_id) {
                    bar.finish_and_clear();
                }
                let _ = self.multi.println(format_event(event));
            }
            _ => {
                let _ = self.multi.println(format_event(event));
            }
        }
    }
}

impl Default for ProgressDisplay {
    fn default() -> Self {
        Self::new()
    }
}
